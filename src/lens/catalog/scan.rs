//! Directory scanning
//!
//! Lists the regular files below a search path. Entries are sorted by name in
//! each directory so scans are reproducible across platforms.

use std::path::{Path, PathBuf};

use crate::error::{Result, UpgradeError};

/// A file found while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub file_name: String,
    pub path: PathBuf,
}

/// List files in `root`, descending into subdirectories when `recursive`
pub fn list_files(root: &Path, recursive: bool) -> Result<Vec<ScannedFile>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let read_dir = std::fs::read_dir(&dir).map_err(|e| UpgradeError::DirectoryScan {
            path: dir.clone(),
            source: e,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| UpgradeError::DirectoryScan {
                path: dir.clone(),
                source: e,
            })?;
            let file_type = entry.file_type().map_err(|e| UpgradeError::DirectoryScan {
                path: entry.path(),
                source: e,
            })?;
            entries.push((entry.path(), file_type));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut subdirs = Vec::new();
        for (path, file_type) in entries {
            // Symlinked directories are never descended into; symlinked files are listed
            let is_file = if file_type.is_symlink() {
                path.is_file()
            } else {
                file_type.is_file()
            };

            if file_type.is_dir() {
                if recursive {
                    subdirs.push(path);
                }
            } else if is_file {
                // Names that are not valid UTF-8 can never match a pattern
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    files.push(ScannedFile {
                        file_name: name.to_string(),
                        path: path.clone(),
                    });
                }
            }
        }

        // Visit subdirectories in name order
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(files)
}
