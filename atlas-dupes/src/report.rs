//! Analysis report types.

use std::path::PathBuf;

use asset_guid::AssetGuid;
use serde::Serialize;

use crate::analyzer::{Analysis, Container};
use crate::error::ScanError;
use crate::resolver::AssetKind;

/// Shown in place of the asset path when a duplicated GUID has no resolution.
pub const MISSING_PATH: &str = "Missing path";

/// A container as listed in the report.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Container display name (file stem).
    pub name: String,
    /// Path the container was read from.
    pub path: PathBuf,
    /// Number of image GUIDs the container references.
    pub images: usize,
}

impl From<&Container> for ContainerSummary {
    fn from(container: &Container) -> Self {
        Self {
            name: container.name.clone(),
            path: container.path.clone(),
            images: container.guids.len(),
        }
    }
}

/// An image referenced by more than one container.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct DuplicateEntry {
    /// The shared image GUID.
    pub guid: AssetGuid,
    /// Project-relative asset path, if the GUID resolved.
    pub asset_path: Option<String>,
    /// Asset file name without extension (empty when unresolved).
    pub asset_name: String,
    /// Resolved asset kind, if the GUID resolved.
    pub kind: Option<AssetKind>,
    /// Referencing containers, in scan order.
    pub owners: Vec<ContainerSummary>,
}

impl DuplicateEntry {
    /// Asset path for display, or [`MISSING_PATH`].
    #[must_use]
    pub fn display_path(&self) -> &str {
        self.asset_path.as_deref().unwrap_or(MISSING_PATH)
    }

    /// Case-insensitive substring match on the asset name or path.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.asset_name.to_lowercase().contains(&needle)
            || self
                .asset_path
                .as_deref()
                .is_some_and(|p| p.to_lowercase().contains(&needle))
    }
}

/// Result of an analysis run.
///
/// `scan_errors` lists everything that was left out (unreadable atlases,
/// missing sources, unreadable meta files). A non-empty list means the
/// duplicate list may be incomplete.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct AnalysisReport {
    /// Number of containers successfully read.
    pub scanned_containers: usize,
    /// Number of containers that could not be read.
    pub failed_containers: usize,
    /// Distinct image GUIDs across all containers.
    pub unique_guids: usize,
    /// True when no container was found to analyze.
    pub nothing_to_analyze: bool,
    /// Containers that were read, in scan order.
    pub containers: Vec<ContainerSummary>,
    /// Every image referenced by more than one container, in first-seen order.
    pub duplicates: Vec<DuplicateEntry>,
    /// Warnings for everything left out of the analysis.
    pub scan_errors: Vec<ScanError>,
}

impl AnalysisReport {
    /// Build a report from a finished analysis.
    ///
    /// `extra_errors` are discovery-stage warnings gathered before the scan
    /// (missing sources, meta index problems); they are listed ahead of the
    /// analysis' own errors.
    #[must_use]
    pub fn from_analysis(analysis: &Analysis, extra_errors: Vec<ScanError>) -> Self {
        let duplicates = analysis
            .duplicates
            .iter()
            .map(|guid| duplicate_entry(analysis, guid))
            .collect();

        let mut scan_errors = extra_errors;
        scan_errors.extend(analysis.scan_errors.iter().cloned());

        Self {
            scanned_containers: analysis.containers.len(),
            failed_containers: analysis.scan_errors.len(),
            unique_guids: analysis.index.len(),
            nothing_to_analyze: analysis.containers.is_empty() && analysis.scan_errors.is_empty(),
            containers: analysis.containers.iter().map(ContainerSummary::from).collect(),
            duplicates,
            scan_errors,
        }
    }

    /// Report for a run that found no containers at all.
    #[must_use]
    pub fn nothing_to_analyze(scan_errors: Vec<ScanError>) -> Self {
        Self {
            scanned_containers: 0,
            failed_containers: 0,
            unique_guids: 0,
            nothing_to_analyze: true,
            containers: Vec::new(),
            duplicates: Vec::new(),
            scan_errors,
        }
    }

    /// Number of duplicated images.
    #[must_use]
    pub fn duplicates_count(&self) -> usize {
        self.duplicates.len()
    }

    /// Whether any image is shared between containers.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }

    /// Duplicates whose asset name or path contains `query`, ignoring case.
    /// An empty query keeps everything.
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<&DuplicateEntry> {
        self.duplicates.iter().filter(|d| d.matches(query)).collect()
    }

}

fn duplicate_entry(analysis: &Analysis, guid: &AssetGuid) -> DuplicateEntry {
    let asset = analysis.assets.get(guid);
    DuplicateEntry {
        guid: guid.clone(),
        asset_path: asset.map(|a| a.path.clone()),
        asset_name: asset.map(|a| a.display_name().to_owned()).unwrap_or_default(),
        kind: asset.map(|a| a.kind),
        owners: analysis
            .owners_of(guid)
            .into_iter()
            .map(ContainerSummary::from)
            .collect(),
    }
}
