//! GUID resolution from `.meta` sidecar files.
//!
//! Every asset in a project has a `<asset>.meta` YAML file next to it holding
//! the asset's GUID and its importer settings. [`MetaIndex`] walks the project
//! once, reads each meta file, and answers GUID lookups from memory.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use asset_guid::AssetGuid;
use indexmap::IndexMap;
use indexmap::map::Entry;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{DEFAULT_ATLAS_EXTENSIONS, FsSourceConfig, ProjectConfig};
use crate::error::{ScanError, ScanErrorKind};
use crate::resolver::{AssetKind, AssetResolver, ResolvedAsset};
use crate::strategy::fs::{ReadOutcome, is_not_skip_dir, read_file_bounded};

/// Texture importer `textureType` value for sprites.
const TEXTURE_TYPE_SPRITE: i64 = 8;

/// Extensions imported as textures when the importer block cannot be read.
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "tga", "psd", "gif", "bmp", "tif", "tiff", "exr", "hdr", "iff", "pict",
];

/// The asset's own GUID: a top-level `guid:` line.
static META_GUID_LINE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?m)^guid:\s*([a-fA-F0-9]{32})\s*$") {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid meta guid regex: {err}"),
    });

/// In-memory GUID → asset map built from `.meta` files.
#[derive(Debug, Clone, Default)]
pub struct MetaIndex {
    assets: IndexMap<AssetGuid, ResolvedAsset>,
}

impl MetaIndex {
    /// Walk the project's search directories and index every `.meta` file.
    ///
    /// Returns the index together with warnings for meta files that could not
    /// be read or carry no GUID. A missing search directory is not an error;
    /// if none of them exist the project root itself is walked.
    #[must_use]
    pub fn build(project: &ProjectConfig, fs_config: &FsSourceConfig) -> (Self, Vec<ScanError>) {
        let mut index = Self::default();
        let mut scan_errors = Vec::new();

        let mut roots: Vec<PathBuf> = project
            .search_dirs
            .iter()
            .map(|dir| project.root.join(dir))
            .filter(|dir| dir.is_dir())
            .collect();
        if roots.is_empty() {
            roots.push(project.root.clone());
        }

        let mut meta_files = Vec::new();
        for root in &roots {
            for entry_result in WalkDir::new(root)
                .follow_links(fs_config.follow_links)
                .max_depth(fs_config.max_depth)
                .into_iter()
                .filter_entry(is_not_skip_dir)
            {
                let entry = match entry_result {
                    Ok(e) => e,
                    Err(walk_err) => {
                        let path = walk_err
                            .path()
                            .map_or_else(|| root.clone(), Path::to_path_buf);
                        scan_errors.push(ScanError::new(
                            path,
                            ScanErrorKind::WalkError,
                            format!("Directory traversal error: {walk_err}"),
                        ));
                        continue;
                    }
                };
                let path = entry.path();
                if entry.file_type().is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some("meta")
                {
                    meta_files.push(path.to_path_buf());
                }
            }
        }
        meta_files.sort();
        meta_files.dedup();

        for meta_path in &meta_files {
            let content = match read_file_bounded(meta_path, fs_config.max_file_size) {
                ReadOutcome::Ok(c) => c,
                ReadOutcome::Err(e) => {
                    warn!("{}", e.format_human_readable());
                    scan_errors.push(e);
                    continue;
                }
            };

            let asset_path = asset_path_for(meta_path);
            let Some(guid) = guid_from_meta(&content) else {
                let err = ScanError::new(
                    meta_path.clone(),
                    ScanErrorKind::MetaParseError,
                    "Meta file has no guid",
                );
                warn!("{}", err.format_human_readable());
                scan_errors.push(err);
                continue;
            };
            let kind = kind_from_meta(&content, &asset_path);
            let display = project_relative(&asset_path, &project.root);
            index.insert(guid, ResolvedAsset::new(display, kind));
        }

        debug!("Indexed {} assets from {} meta files", index.len(), meta_files.len());
        (index, scan_errors)
    }

    /// Add an entry. The first entry for a GUID wins; later ones are logged and ignored.
    pub fn insert(&mut self, guid: AssetGuid, asset: ResolvedAsset) {
        match self.assets.entry(guid) {
            Entry::Occupied(existing) => {
                warn!(
                    "GUID {} is claimed by both {} and {}; keeping the first",
                    existing.key(),
                    existing.get().path,
                    asset.path
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(asset);
            }
        }
    }

    /// Number of indexed assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetResolver for MetaIndex {
    fn resolve(&self, guid: &AssetGuid) -> Option<ResolvedAsset> {
        self.assets.get(guid).cloned()
    }
}

/// Read the asset's own GUID from meta file text.
fn guid_from_meta(content: &str) -> Option<AssetGuid> {
    let caps = META_GUID_LINE.captures(content)?;
    AssetGuid::parse(caps.get(1)?.as_str()).ok()
}

/// Classify an asset from its meta file, falling back to the extension.
fn kind_from_meta(content: &str, asset_path: &Path) -> AssetKind {
    match serde_saphyr::from_str::<Value>(content) {
        Ok(doc) => kind_from_meta_doc(&doc).unwrap_or_else(|| kind_from_extension(asset_path)),
        Err(err) => {
            debug!(
                "Meta for {} is not plain YAML ({err}); classifying by extension",
                asset_path.display()
            );
            kind_from_extension(asset_path)
        }
    }
}

fn kind_from_meta_doc(doc: &Value) -> Option<AssetKind> {
    let folder = doc.get("folderAsset").is_some_and(|v| match v {
        Value::Bool(b) => *b,
        Value::String(s) => s == "yes",
        _ => false,
    });
    if folder {
        return Some(AssetKind::Folder);
    }

    let importer = doc.get("TextureImporter")?;
    let texture_type = importer.get("textureType").and_then(Value::as_i64);
    if texture_type == Some(TEXTURE_TYPE_SPRITE) {
        Some(AssetKind::Sprite)
    } else {
        Some(AssetKind::Texture)
    }
}

fn kind_from_extension(asset_path: &Path) -> AssetKind {
    let Some(ext) = asset_path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
    else {
        return AssetKind::Other;
    };
    if DEFAULT_ATLAS_EXTENSIONS.contains(&ext.as_str()) {
        AssetKind::SpriteAtlas
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        AssetKind::Texture
    } else {
        AssetKind::Other
    }
}

/// `foo.png.meta` → `foo.png`.
fn asset_path_for(meta_path: &Path) -> PathBuf {
    meta_path.with_extension("")
}

/// Path relative to `root`, `/`-separated.
fn project_relative(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
