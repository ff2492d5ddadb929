//! Filesystem container source.
//!
//! Discovers atlas files on disk and reads them safely for the analyzer.
//! - Symlinks are not followed by default (`follow_links: false`)
//! - Device files, pipes, and sockets are skipped
//! - Maximum directory depth is enforced
//! - Bounded streaming reads cap memory use per file

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use glob::Pattern;
use walkdir::WalkDir;

use crate::analyzer::{ContainerLoader, ContainerRef};
use crate::config::FsSourceConfig;
use crate::error::{ScanError, ScanErrorKind};

/// Directories to skip: editor caches and build output.
pub const SKIP_DIRS: &[&str] = &["Library", "Temp", "Logs", "obj", ".git"];

/// Result of attempting to read a file.
pub enum ReadOutcome {
    /// File was read successfully; contains the UTF-8 content.
    Ok(String),
    /// File could not be read; contains the scan error.
    Err(ScanError),
}

/// Check if a path matches any of the exclude patterns
fn matches_exclude(path: &Path, exclude_patterns: &[Pattern]) -> bool {
    let path_str = path.to_string_lossy();
    exclude_patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
    })
}

/// Check if a directory entry is a skip directory (for `WalkDir::filter_entry`).
/// Returns `true` if the entry should be **included** (i.e., is NOT a skip dir).
pub(crate) fn is_not_skip_dir(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() > 0
        && entry.file_type().is_dir()
        && let Some(name) = entry.file_name().to_str()
    {
        return !SKIP_DIRS.contains(&name);
    }
    true
}

fn has_atlas_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}

/// Find all atlas containers under the configured paths.
///
/// Returns `(containers, scan_errors)`:
/// - `containers`: atlas files, sorted by path and de-duplicated on their
///   canonical path, so an atlas reached through several sources (or several
///   spellings of one path) is scanned once, under its first spelling.
/// - `scan_errors`: missing sources, walk errors and bad exclude patterns.
///   Each one is a warning; discovery continues past it.
///
/// An explicitly listed file is taken as an atlas whatever its extension.
#[must_use]
pub fn find_containers(config: &FsSourceConfig) -> (Vec<ContainerRef>, Vec<ScanError>) {
    let mut files = Vec::new();
    let mut scan_errors = Vec::new();

    let mut exclude_patterns = Vec::with_capacity(config.exclude.len());
    for pat_str in &config.exclude {
        match Pattern::new(pat_str) {
            Ok(pat) => exclude_patterns.push(pat),
            Err(e) => {
                scan_errors.push(ScanError::new(
                    pat_str,
                    ScanErrorKind::InvalidExcludePattern,
                    format!("Invalid exclude glob pattern '{pat_str}': {e}"),
                ));
            }
        }
    }

    for root in &config.paths {
        if !root.exists() {
            scan_errors.push(ScanError::new(
                root.clone(),
                ScanErrorKind::MissingSource,
                "Source does not exist",
            ));
            continue;
        }

        if root.is_file() {
            if !matches_exclude(root, &exclude_patterns) {
                files.push(root.clone());
            }
            continue;
        }

        for entry_result in WalkDir::new(root)
            .follow_links(config.follow_links)
            .max_depth(config.max_depth)
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

            let file_path = entry.path();

            if !file_path.is_file() {
                continue;
            }

            // Skip devices, pipes, sockets — only regular files
            #[cfg(unix)]
            {
                use std::os::unix::fs::FileTypeExt;
                if let Ok(ft) = entry.metadata().map(|m| m.file_type())
                    && (ft.is_block_device()
                        || ft.is_char_device()
                        || ft.is_fifo()
                        || ft.is_socket())
                {
                    continue;
                }
            }

            if !has_atlas_extension(file_path, &config.atlas_extensions) {
                continue;
            }

            if matches_exclude(file_path, &exclude_patterns) {
                continue;
            }

            files.push(file_path.to_path_buf());
        }
    }

    files.sort();
    let mut seen = HashSet::new();
    files.retain(|path| seen.insert(std::fs::canonicalize(path).unwrap_or_else(|_| path.clone())));

    let containers = files.into_iter().map(ContainerRef::from_path).collect();
    (containers, scan_errors)
}

/// Read a file using a bounded streaming read, enforcing `max_file_size`.
///
/// Returns `ReadOutcome::Err` if:
/// - The file exceeds `max_file_size`
/// - An I/O error occurs
/// - The content is not valid UTF-8
pub fn read_file_bounded(path: &Path, max_file_size: u64) -> ReadOutcome {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            return ReadOutcome::Err(ScanError::new(
                path,
                ScanErrorKind::IoError,
                format!("Failed to open file: {e}"),
            ));
        }
    };

    // Read at most max_file_size + 1 bytes to detect oversized files
    let mut buffer = Vec::new();
    if let Err(e) = file.take(max_file_size + 1).read_to_end(&mut buffer) {
        return ReadOutcome::Err(ScanError::new(
            path,
            ScanErrorKind::IoError,
            format!("Failed to read file: {e}"),
        ));
    }

    if buffer.len() as u64 > max_file_size {
        return ReadOutcome::Err(ScanError::new(
            path,
            ScanErrorKind::FileTooLarge,
            format!("File exceeds maximum size of {max_file_size} bytes"),
        ));
    }

    match String::from_utf8(buffer) {
        Ok(content) => ReadOutcome::Ok(content),
        Err(_) => ReadOutcome::Err(ScanError::new(
            path,
            ScanErrorKind::InvalidEncoding,
            "File is not valid UTF-8",
        )),
    }
}

/// Loads container text from disk with [`read_file_bounded`].
#[derive(Debug, Clone, Copy)]
pub struct FsLoader {
    max_file_size: u64,
}

impl FsLoader {
    #[must_use]
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }
}

impl ContainerLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<String, ScanError> {
        match read_file_bounded(path, self.max_file_size) {
            ReadOutcome::Ok(content) => Ok(content),
            ReadOutcome::Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config_for(paths: Vec<PathBuf>) -> FsSourceConfig {
        let mut cfg = FsSourceConfig::default();
        cfg.paths = paths;
        cfg
    }

    #[test]
    fn test_find_containers_walks_folders_and_skips_library() {
        let tmp = TempDir::new().unwrap();
        let atlases = tmp.path().join("Atlases");
        let library = tmp.path().join("Library");
        fs::create_dir_all(&atlases).unwrap();
        fs::create_dir_all(&library).unwrap();
        fs::write(atlases.join("ui.spriteatlas"), "").unwrap();
        fs::write(atlases.join("ui.spriteatlas.meta"), "").unwrap();
        fs::write(atlases.join("hud.spriteatlasv2"), "").unwrap();
        fs::write(library.join("cached.spriteatlas"), "").unwrap();

        let (containers, errors) = find_containers(&config_for(vec![tmp.path().to_path_buf()]));
        assert!(errors.is_empty(), "{errors:?}");
        let names: Vec<&str> = containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["hud", "ui"]);
    }

    #[test]
    fn test_find_containers_dedups_explicit_and_folder() {
        let tmp = TempDir::new().unwrap();
        let atlas = tmp.path().join("ui.spriteatlas");
        fs::write(&atlas, "").unwrap();

        let (containers, _) =
            find_containers(&config_for(vec![tmp.path().to_path_buf(), atlas.clone()]));
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].path, atlas);
    }

    #[test]
    fn test_find_containers_dedups_differently_spelled_paths() {
        let tmp = TempDir::new().unwrap();
        let atlases = tmp.path().join("Atlases");
        fs::create_dir_all(&atlases).unwrap();
        fs::write(atlases.join("ui.spriteatlas"), "").unwrap();

        let roundabout = tmp.path().join("Atlases").join("..").join("Atlases");
        let (containers, errors) = find_containers(&config_for(vec![
            roundabout,
            atlases.join("ui.spriteatlas"),
        ]));
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].name, "ui");
    }

    #[test]
    fn test_find_containers_missing_source_is_warning() {
        let tmp = TempDir::new().unwrap();
        let atlas = tmp.path().join("ui.spriteatlas");
        fs::write(&atlas, "").unwrap();
        let missing = tmp.path().join("gone");

        let (containers, errors) = find_containers(&config_for(vec![missing, atlas]));
        assert_eq!(containers.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ScanErrorKind::MissingSource);
    }

    #[test]
    fn test_find_containers_invalid_exclude_pattern() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = config_for(vec![tmp.path().to_path_buf()]);
        cfg.exclude = vec!["[".to_owned()];
        let (_, errors) = find_containers(&cfg);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ScanErrorKind::InvalidExcludePattern);
    }

    #[test]
    fn test_read_file_bounded_too_large() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("big.spriteatlas");
        fs::write(&file, "0123456789abcdef").unwrap();
        match read_file_bounded(&file, 4) {
            ReadOutcome::Err(e) => assert_eq!(e.kind, ScanErrorKind::FileTooLarge),
            ReadOutcome::Ok(_) => panic!("expected FileTooLarge"),
        }
    }

    #[test]
    fn test_fs_loader_invalid_utf8() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("bin.spriteatlas");
        fs::write(&file, [0xFF, 0xFE, 0x00, 0x80]).unwrap();
        let err = FsLoader::new(1024).load(&file).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::InvalidEncoding);
    }
}
