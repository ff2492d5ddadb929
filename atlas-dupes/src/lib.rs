//! # atlas-dupes
//!
//! Finds textures that are packed into more than one sprite atlas.
//!
//! Atlas assets reference their images with `guid: <32 hex digits>` markers.
//! The crate separates the **core analyzer** (input-agnostic: containers in,
//! reference index out) from **input strategies** (discovering atlas files on
//! disk) and **resolvers** (turning a GUID into an asset path and kind).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use atlas_dupes::{analyze_fs, AnalysisConfig, FsSourceConfig, ProjectConfig};
//!
//! let mut fs_config = FsSourceConfig::default();
//! fs_config.paths = vec![PathBuf::from("Assets/Atlases")];
//!
//! let mut project = ProjectConfig::default();
//! project.root = PathBuf::from(".");
//!
//! let report = analyze_fs(&fs_config, &project, &AnalysisConfig::default()).unwrap();
//! println!("Atlases scanned: {}", report.scanned_containers);
//! for dup in &report.duplicates {
//!     println!("{} is in {} atlases", dup.display_path(), dup.owners.len());
//! }
//! ```
//!
//! Embedders with their own asset database can skip the filesystem layer and
//! call [`DuplicateReferenceAnalyzer::scan`] with any [`AssetResolver`] and
//! [`ContainerLoader`].

mod analyzer;
mod config;
mod error;
mod extract;
mod meta;
pub mod output;
mod report;
mod resolver;
pub mod strategy;

pub use analyzer::{
    Analysis, Container, ContainerLoader, ContainerRef, DuplicateReferenceAnalyzer,
    ReferenceIndex,
};
pub use asset_guid::{AssetGuid, GuidError};
pub use config::{AnalysisConfig, DEFAULT_ATLAS_EXTENSIONS, FsSourceConfig, ProjectConfig};
pub use error::{ScanError, ScanErrorKind};
pub use extract::extract_guids;
pub use meta::MetaIndex;
pub use report::{AnalysisReport, ContainerSummary, DuplicateEntry, MISSING_PATH};
pub use resolver::{AssetKind, AssetResolver, ResolvedAsset};

use strategy::fs::{FsLoader, find_containers};
use tracing::{info, warn};

/// Find images shared between atlases on disk.
///
/// This is the primary public API: discovers atlas files from
/// `fs_config.paths`, indexes the project's `.meta` files for GUID
/// resolution, and runs one scan.
///
/// # Errors
///
/// Returns an error if `fs_config.paths` is empty or the project root does not exist.
/// A source path that does not exist, an unreadable atlas or meta file is a
/// warning in `report.scan_errors`, never an error. If no atlas is found the
/// report has `nothing_to_analyze` set.
pub fn analyze_fs(
    fs_config: &FsSourceConfig,
    project: &ProjectConfig,
    analysis_config: &AnalysisConfig,
) -> anyhow::Result<AnalysisReport> {
    if fs_config.paths.is_empty() {
        anyhow::bail!("No paths provided for analysis");
    }
    if !project.root.is_dir() {
        anyhow::bail!(
            "Project root does not exist: {}",
            project.root.display()
        );
    }

    let (mut containers, mut scan_errors) = find_containers(fs_config);
    for err in &scan_errors {
        warn!("{}", err.format_human_readable());
    }

    if containers.len() > fs_config.max_containers {
        let first_skipped = containers[fs_config.max_containers].path.clone();
        scan_errors.push(ScanError::new(
            first_skipped,
            ScanErrorKind::LimitExceeded,
            format!(
                "Scan truncated: max_containers limit ({}) reached; {} atlas file(s) not scanned",
                fs_config.max_containers,
                containers.len() - fs_config.max_containers
            ),
        ));
        containers.truncate(fs_config.max_containers);
    }

    if containers.is_empty() {
        info!("No atlas files found; nothing to analyze");
        return Ok(AnalysisReport::nothing_to_analyze(scan_errors));
    }

    let (index, meta_errors) = MetaIndex::build(project, fs_config);
    info!("Resolved {} assets from project meta files", index.len());
    scan_errors.extend(meta_errors);

    let loader = FsLoader::new(fs_config.max_file_size);
    let analysis =
        DuplicateReferenceAnalyzer::new(&index, analysis_config).scan(&containers, &loader);

    Ok(AnalysisReport::from_analysis(&analysis, scan_errors))
}
