//! Configuration types for atlas analysis.
//!
//! Split into the core analysis config (what counts as an image reference),
//! source-specific config (how atlas files are discovered on disk) and project
//! config (where GUIDs are resolved). The core analyzer never sees filesystem
//! options.

use std::path::PathBuf;

use crate::resolver::AssetKind;

/// File extensions recognized as sprite-atlas assets.
pub const DEFAULT_ATLAS_EXTENSIONS: &[&str] = &["spriteatlas", "spriteatlasv2"];

/// Core analysis config: applies regardless of where containers come from.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct AnalysisConfig {
    /// Resolved asset kinds that count as image references.
    ///
    /// GUIDs resolving to any other kind (folders, atlases, scripts) are dropped
    /// before indexing. Defaults to textures and sprites.
    pub accepted_kinds: Vec<AssetKind>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            accepted_kinds: vec![AssetKind::Texture, AssetKind::Sprite],
        }
    }
}

impl AnalysisConfig {
    /// Whether a resolved kind is counted as an image reference.
    #[must_use]
    pub fn accepts(&self, kind: AssetKind) -> bool {
        self.accepted_kinds.contains(&kind)
    }
}

/// Project options for GUID resolution.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ProjectConfig {
    /// Project root. Resolved asset paths are reported relative to it.
    pub root: PathBuf,
    /// Directories under `root` searched for `.meta` files.
    ///
    /// Missing entries are ignored; if none exist the whole root is searched.
    pub search_dirs: Vec<PathBuf>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            search_dirs: vec![PathBuf::from("Assets"), PathBuf::from("Packages")],
        }
    }
}

/// Filesystem-specific source options.
///
/// NOTE: `paths` is required and must be non-empty. Each entry is either a
/// single atlas file or a folder searched recursively for atlases.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FsSourceConfig {
    /// Atlas files or folders to scan. Required, must be non-empty.
    pub paths: Vec<PathBuf>,
    /// Exclude patterns (glob format), matched against the full path and the file name.
    pub exclude: Vec<String>,
    /// Extensions (without the dot) treated as atlas files when walking folders.
    pub atlas_extensions: Vec<String>,
    /// Maximum file size in bytes (default: 10 MB).
    pub max_file_size: u64,
    /// Whether to follow symbolic links (default: `false`).
    pub follow_links: bool,
    /// Maximum directory traversal depth (default: 64).
    pub max_depth: usize,
    /// Maximum number of containers to scan (default: `100_000`).
    pub max_containers: usize,
}

impl Default for FsSourceConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            exclude: Vec::new(),
            atlas_extensions: DEFAULT_ATLAS_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_owned())
                .collect(),
            max_file_size: 10_485_760,
            follow_links: false,
            max_depth: 64,
            max_containers: 100_000,
        }
    }
}
