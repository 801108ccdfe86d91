use std::path::{Path, PathBuf};

use log::info;
use walkdir::{DirEntry, WalkDir};

use crate::error::{ExportError, Result};

/// A file found under the root, waiting to be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: PathBuf,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileRecord { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Recursively collect every file under `root` whose name ends with `suffix`.
///
/// A folder whose path (root included) contains `exclude_marker` is pruned
/// together with everything below it; the match is a case-sensitive
/// substring test and an empty marker prunes nothing. Entries are visited
/// depth-first, sorted by name within each folder.
pub fn discover(root: &Path, suffix: &str, exclude_marker: &str) -> Result<Vec<FileRecord>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, exclude_marker));

    for entry in walker {
        let entry = entry.map_err(|source| ExportError::Discovery {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if !entry.file_name().to_string_lossy().ends_with(suffix) {
            continue;
        }
        info!("Located {}", entry.path().display());
        files.push(FileRecord::new(entry.into_path()));
    }

    info!(
        "Located {} {suffix} file(s) under {}",
        files.len(),
        root.display()
    );
    Ok(files)
}

fn is_excluded_dir(entry: &DirEntry, marker: &str) -> bool {
    !marker.is_empty()
        && entry.file_type().is_dir()
        && entry.path().to_string_lossy().contains(marker)
}
