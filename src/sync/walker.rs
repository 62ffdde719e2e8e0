//! Directory traversal - Lists the files of a local root that should be synced.

use anyhow::{bail, Result};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// A local file scheduled for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute (or root-joined) path on disk
    pub path: PathBuf,
    /// Path relative to the root with `/` separators; the remote key
    pub relative_path: String,
}

/// Substring-based ignore list.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    patterns: Vec<String>,
}

impl IgnoreList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// First pattern contained in `relative_path`, if any.
    pub fn matched(&self, relative_path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| relative_path.contains(p.as_str()))
            .map(String::as_str)
    }

    pub fn is_ignored(&self, relative_path: &str) -> bool {
        self.matched(relative_path).is_some()
    }
}

/// Convert a path below the root into the remote key (`dir/file.txt`).
fn remote_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Collect all regular files under `root`, in sorted order, minus ignored paths.
///
/// Directories whose relative path matches a pattern are not descended into,
/// since every path below them would match as well. Symlinks to files are
/// collected and read through the link; symlinked directories are not followed.
pub fn collect_files(root: &Path, ignore: &IgnoreList) -> Result<Vec<FileEntry>> {
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let key = match entry.path().strip_prefix(root) {
                Ok(rel) => remote_key(rel),
                Err(_) => return true,
            };
            match ignore.matched(&key) {
                Some(pattern) => {
                    info!("Skipping ignored directory: {} (matches '{}')", key, pattern);
                    false
                }
                None => true,
            }
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Cannot read directory entry: {}", e);
                continue;
            }
        };
        let file_type = entry.file_type();
        let is_file =
            file_type.is_file() || (entry.path_is_symlink() && entry.path().is_file());

        let relative_path = match entry.path().strip_prefix(root) {
            Ok(rel) => remote_key(rel),
            Err(_) => continue,
        };
        if let Some(pattern) = ignore.matched(&relative_path) {
            info!("Skipping ignored file: {} (matches '{}')", relative_path, pattern);
            continue;
        }
        if !is_file {
            if !file_type.is_dir() {
                warn!("Skipping non-regular entry: {}", relative_path);
            }
            continue;
        }

        files.push(FileEntry {
            path: entry.into_path(),
            relative_path,
        });
    }

    Ok(files)
}
