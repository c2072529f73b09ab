// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Resolve command-line paths to documentation files.

use std::fs;
use std::path::{Path, PathBuf};

use globset::GlobSet;

/// Which files directory expansion picks up.
#[derive(Debug, Clone)]
pub struct Filter {
    extensions: Vec<String>,
    exclude: GlobSet,
}

impl Filter {
    pub fn new(extensions: Vec<String>, exclude: GlobSet) -> Self {
        Self { extensions, exclude }
    }

    fn wanted_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|want| want.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    fn excluded(&self, path: &Path, root: &Path) -> bool {
        if self.exclude.is_match(path) {
            return true;
        }
        path.strip_prefix(root).map(|rel| self.exclude.is_match(rel)).unwrap_or(false)
    }
}

/// Expand `inputs` into a sorted, deduplicated list of files.
///
/// Files named directly are kept whatever their extension unless excluded.
/// Directories are walked recursively, skipping hidden directories.
/// Missing paths are reported and ignored.
pub fn discover(inputs: &[PathBuf], filter: &Filter) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            if !filter.excluded(input, Path::new("")) {
                files.push(input.clone());
            }
        } else if input.is_dir() {
            walk(input, input, filter, &mut files);
        } else {
            tracing::warn!(path = %input.display(), "no such file or directory");
        }
    }
    files.sort();
    files.dedup();
    tracing::debug!(count = files.len(), "resolved input files");
    files
}

fn walk(dir: &Path, root: &Path, filter: &Filter, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if filter.excluded(&path, root) {
            continue;
        }
        if path.is_dir() {
            if !is_hidden(&path) {
                walk(&path, root, filter, files);
            }
        } else if filter.wanted_extension(&path) {
            files.push(path);
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
