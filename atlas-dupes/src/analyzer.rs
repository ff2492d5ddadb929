//! Duplicate-reference analysis.
//!
//! Input-agnostic core: takes a list of containers, a loader that produces
//! their text and a resolver that classifies GUIDs. Nothing here touches the
//! filesystem directly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use asset_guid::AssetGuid;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::ScanError;
use crate::extract::extract_guids;
use crate::resolver::{AssetResolver, ResolvedAsset};

/// A container to scan: display name plus the path its text is loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerRef {
    /// Name used in reports.
    pub name: String,
    /// Path handed to the [`ContainerLoader`].
    pub path: PathBuf,
}

impl ContainerRef {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Name the container after its file stem.
    #[must_use]
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_stem()
            .map_or_else(|| path.to_string_lossy(), |s| s.to_string_lossy())
            .into_owned();
        Self { name, path }
    }
}

/// Produces container text.
pub trait ContainerLoader {
    /// Load the text behind `path`.
    ///
    /// # Errors
    /// Returns a [`ScanError`] when the text cannot be produced. The analyzer
    /// records it and moves on to the next container.
    fn load(&self, path: &Path) -> Result<String, ScanError>;
}

impl<F> ContainerLoader for F
where
    F: Fn(&Path) -> Result<String, ScanError>,
{
    fn load(&self, path: &Path) -> Result<String, ScanError> {
        self(path)
    }
}

/// A scanned container with its image GUIDs, in first-reference order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    /// Name used in reports.
    pub name: String,
    /// Path the text was loaded from.
    pub path: PathBuf,
    /// Accepted image GUIDs, each listed once.
    pub guids: Vec<AssetGuid>,
}

/// GUID → positions (into [`Analysis::containers`]) of the containers referencing it.
///
/// GUIDs iterate in first-seen order; each owner list is in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceIndex {
    entries: IndexMap<AssetGuid, Vec<usize>>,
}

impl ReferenceIndex {
    fn add(&mut self, guid: &AssetGuid, container: usize) {
        self.entries.entry(guid.clone()).or_default().push(container);
    }

    /// Owner positions for `guid`.
    #[must_use]
    pub fn owners(&self, guid: &AssetGuid) -> Option<&[usize]> {
        self.entries.get(guid).map(Vec::as_slice)
    }

    /// Number of distinct GUIDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetGuid, &[usize])> {
        self.entries.iter().map(|(g, owners)| (g, owners.as_slice()))
    }
}

/// Result of one scan.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Analysis {
    /// Containers that were read, in scan order.
    pub containers: Vec<Container>,
    /// Every accepted GUID and the containers referencing it.
    pub index: ReferenceIndex,
    /// GUIDs with more than one owner, in index order.
    pub duplicates: Vec<AssetGuid>,
    /// Resolution of every indexed GUID.
    pub assets: IndexMap<AssetGuid, ResolvedAsset>,
    /// Containers that could not be read.
    pub scan_errors: Vec<ScanError>,
}

impl Analysis {
    /// Containers referencing `guid`, in scan order.
    #[must_use]
    pub fn owners_of(&self, guid: &AssetGuid) -> Vec<&Container> {
        self.index
            .owners(guid)
            .unwrap_or_default()
            .iter()
            .filter_map(|&i| self.containers.get(i))
            .collect()
    }
}

/// Finds images referenced by more than one container.
pub struct DuplicateReferenceAnalyzer<'a, R: ?Sized> {
    resolver: &'a R,
    config: &'a AnalysisConfig,
}

impl<'a, R: AssetResolver + ?Sized> DuplicateReferenceAnalyzer<'a, R> {
    #[must_use]
    pub fn new(resolver: &'a R, config: &'a AnalysisConfig) -> Self {
        Self { resolver, config }
    }

    /// Scan `sources` and build the reference index.
    ///
    /// Every call starts from nothing; no state carries over between scans.
    /// A container whose text cannot be loaded is logged, recorded in
    /// [`Analysis::scan_errors`] and left out. GUIDs that do not resolve, or
    /// resolve to a kind the config does not accept, are dropped silently.
    pub fn scan<L: ContainerLoader + ?Sized>(
        &self,
        sources: &[ContainerRef],
        loader: &L,
    ) -> Analysis {
        let mut analysis = Analysis::default();
        // A GUID is resolved at most once per scan.
        let mut resolved: HashMap<AssetGuid, Option<ResolvedAsset>> = HashMap::new();

        for source in sources {
            let text = match loader.load(&source.path) {
                Ok(text) => text,
                Err(err) => {
                    warn!(
                        "Skipping container {}: {}",
                        source.name,
                        err.format_human_readable()
                    );
                    analysis.scan_errors.push(err);
                    continue;
                }
            };

            let guids: Vec<AssetGuid> = extract_guids(&text)
                .into_iter()
                .filter(|guid| {
                    resolved
                        .entry(guid.clone())
                        .or_insert_with(|| self.resolver.resolve(guid))
                        .as_ref()
                        .is_some_and(|asset| self.config.accepts(asset.kind))
                })
                .collect();

            debug!(
                "Scanned {} ({}): {} image references",
                source.name,
                source.path.display(),
                guids.len()
            );

            let position = analysis.containers.len();
            for guid in &guids {
                analysis.index.add(guid, position);
                if !analysis.assets.contains_key(guid)
                    && let Some(Some(asset)) = resolved.get(guid)
                {
                    analysis.assets.insert(guid.clone(), asset.clone());
                }
            }

            analysis.containers.push(Container {
                name: source.name.clone(),
                path: source.path.clone(),
                guids,
            });
        }

        analysis.duplicates = analysis
            .index
            .iter()
            .filter(|(_, owners)| owners.len() > 1)
            .map(|(guid, _)| guid.clone())
            .collect();

        info!(
            "Scanned {} containers: {} GUIDs, {} referenced by more than one container",
            analysis.containers.len(),
            analysis.index.len(),
            analysis.duplicates.len()
        );

        analysis
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ScanErrorKind;
    use crate::resolver::AssetKind;

    fn guid(c: char) -> AssetGuid {
        AssetGuid::parse(&c.to_string().repeat(32)).unwrap()
    }

    fn marker(c: char) -> String {
        format!("- {{fileID: 21300000, guid: {}, type: 3}}\n", c.to_string().repeat(32))
    }

    fn resolver() -> HashMap<AssetGuid, ResolvedAsset> {
        let mut map = HashMap::new();
        for (c, kind) in [
            ('1', AssetKind::Texture),
            ('2', AssetKind::Sprite),
            ('3', AssetKind::Texture),
            ('f', AssetKind::Folder),
        ] {
            map.insert(guid(c), ResolvedAsset::new(format!("Assets/img{c}.png"), kind));
        }
        map
    }

    fn texts(entries: &[(&str, String)]) -> HashMap<PathBuf, String> {
        entries
            .iter()
            .map(|(p, t)| (PathBuf::from(p), t.clone()))
            .collect()
    }

    fn loader(
        map: &HashMap<PathBuf, String>,
    ) -> impl Fn(&Path) -> Result<String, ScanError> + '_ {
        move |path: &Path| {
            map.get(path).cloned().ok_or_else(|| {
                ScanError::new(path, ScanErrorKind::IoError, "Failed to open file: not found")
            })
        }
    }

    #[test]
    fn test_two_containers_one_shared() {
        let files = texts(&[
            ("A.spriteatlas", marker('1') + &marker('2')),
            ("B.spriteatlas", marker('2') + &marker('3')),
        ]);
        let sources = vec![
            ContainerRef::new("A", "A.spriteatlas"),
            ContainerRef::new("B", "B.spriteatlas"),
        ];
        let resolver = resolver();
        let config = AnalysisConfig::default();
        let analysis =
            DuplicateReferenceAnalyzer::new(&resolver, &config).scan(&sources, &loader(&files));

        assert_eq!(analysis.index.owners(&guid('1')), Some(&[0][..]));
        assert_eq!(analysis.index.owners(&guid('2')), Some(&[0, 1][..]));
        assert_eq!(analysis.index.owners(&guid('3')), Some(&[1][..]));
        assert_eq!(analysis.duplicates, vec![guid('2')]);

        let owners: Vec<&str> = analysis
            .owners_of(&guid('2'))
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(owners, vec!["A", "B"]);
        assert_eq!(analysis.assets[&guid('2')].path, "Assets/img2.png");
    }

    #[test]
    fn test_empty_sources() {
        let resolver = resolver();
        let config = AnalysisConfig::default();
        let files = HashMap::new();
        let analysis =
            DuplicateReferenceAnalyzer::new(&resolver, &config).scan(&[], &loader(&files));
        assert!(analysis.containers.is_empty());
        assert!(analysis.index.is_empty());
        assert!(analysis.duplicates.is_empty());
        assert!(analysis.scan_errors.is_empty());
    }

    #[test]
    fn test_repeat_in_one_container_counts_once() {
        let files = texts(&[("A.spriteatlas", marker('1') + &marker('1'))]);
        let sources = vec![ContainerRef::new("A", "A.spriteatlas")];
        let resolver = resolver();
        let config = AnalysisConfig::default();
        let analysis =
            DuplicateReferenceAnalyzer::new(&resolver, &config).scan(&sources, &loader(&files));

        assert_eq!(analysis.containers[0].guids, vec![guid('1')]);
        assert_eq!(analysis.index.owners(&guid('1')), Some(&[0][..]));
        assert!(analysis.duplicates.is_empty());
    }

    #[test]
    fn test_unreadable_container_is_skipped() {
        let files = texts(&[
            ("A.spriteatlas", marker('1')),
            ("C.spriteatlas", marker('1')),
        ]);
        let sources = vec![
            ContainerRef::new("A", "A.spriteatlas"),
            ContainerRef::new("B", "B.spriteatlas"),
            ContainerRef::new("C", "C.spriteatlas"),
        ];
        let resolver = resolver();
        let config = AnalysisConfig::default();
        let analysis =
            DuplicateReferenceAnalyzer::new(&resolver, &config).scan(&sources, &loader(&files));

        assert_eq!(analysis.scan_errors.len(), 1);
        assert_eq!(analysis.scan_errors[0].file, PathBuf::from("B.spriteatlas"));
        assert_eq!(analysis.containers.len(), 2);
        let owners: Vec<&str> = analysis
            .owners_of(&guid('1'))
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(owners, vec!["A", "C"]);
    }

    #[test]
    fn test_unresolved_and_non_image_dropped() {
        // 'f' resolves to a folder, 'e' does not resolve at all
        let files = texts(&[
            ("A.spriteatlas", marker('f') + &marker('e') + &marker('3')),
            ("B.spriteatlas", marker('f') + &marker('e')),
        ]);
        let sources = vec![
            ContainerRef::new("A", "A.spriteatlas"),
            ContainerRef::new("B", "B.spriteatlas"),
        ];
        let resolver = resolver();
        let config = AnalysisConfig::default();
        let analysis =
            DuplicateReferenceAnalyzer::new(&resolver, &config).scan(&sources, &loader(&files));

        assert_eq!(analysis.containers[0].guids, vec![guid('3')]);
        assert!(analysis.containers[1].guids.is_empty());
        assert!(analysis.duplicates.is_empty());
        assert_eq!(analysis.index.len(), 1);
    }

    #[test]
    fn test_accepted_kinds_widen() {
        let files = texts(&[
            ("A.spriteatlas", marker('f')),
            ("B.spriteatlas", marker('f')),
        ]);
        let sources = vec![
            ContainerRef::new("A", "A.spriteatlas"),
            ContainerRef::new("B", "B.spriteatlas"),
        ];
        let resolver = resolver();
        let mut config = AnalysisConfig::default();
        config.accepted_kinds.push(AssetKind::Folder);
        let analysis =
            DuplicateReferenceAnalyzer::new(&resolver, &config).scan(&sources, &loader(&files));
        assert_eq!(analysis.duplicates, vec![guid('f')]);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let files = texts(&[
            ("A.spriteatlas", marker('3') + &marker('1') + &marker('2')),
            ("B.spriteatlas", marker('2') + &marker('1')),
            ("C.spriteatlas", marker('1')),
        ]);
        let sources = vec![
            ContainerRef::new("A", "A.spriteatlas"),
            ContainerRef::new("B", "B.spriteatlas"),
            ContainerRef::new("C", "C.spriteatlas"),
        ];
        let resolver = resolver();
        let config = AnalysisConfig::default();
        let analyzer = DuplicateReferenceAnalyzer::new(&resolver, &config);
        let first = analyzer.scan(&sources, &loader(&files));
        let second = analyzer.scan(&sources, &loader(&files));

        assert_eq!(first.index, second.index);
        assert_eq!(first.duplicates, second.duplicates);
        assert_eq!(first.duplicates, vec![guid('1'), guid('2')]);
    }

    #[test]
    fn test_owner_count_invariant() {
        let files = texts(&[
            ("A.spriteatlas", marker('1') + &marker('2')),
            ("B.spriteatlas", marker('2') + &marker('3')),
            ("C.spriteatlas", marker('3') + &marker('2')),
        ]);
        let sources = vec![
            ContainerRef::new("A", "A.spriteatlas"),
            ContainerRef::new("B", "B.spriteatlas"),
            ContainerRef::new("C", "C.spriteatlas"),
        ];
        let resolver = resolver();
        let config = AnalysisConfig::default();
        let analysis =
            DuplicateReferenceAnalyzer::new(&resolver, &config).scan(&sources, &loader(&files));

        for container in &analysis.containers {
            for g in &container.guids {
                let owners = analysis.index.owners(g).unwrap().len();
                if analysis.duplicates.contains(g) {
                    assert!(owners >= 2);
                } else {
                    assert_eq!(owners, 1);
                }
            }
        }
    }

    #[test]
    fn test_container_ref_from_path() {
        let c = ContainerRef::from_path(PathBuf::from("Assets/Atlas/ui_common.spriteatlas"));
        assert_eq!(c.name, "ui_common");
    }
}
