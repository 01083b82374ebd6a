//! Directory listing (one level, no recursion)

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::patterns::{to_posix, MatchStyle, PatternSet};
use super::{require_directory, require_some_kind};
use crate::error::Result;

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    /// Absolute, or relative to the listed directory
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

/// Filters for [`list_dir`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Glob patterns matched against the entry's relative path; empty means no filter
    pub patterns: Vec<String>,
    pub include_files: bool,
    pub include_dirs: bool,
    pub absolute_paths: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            include_files: true,
            include_dirs: true,
            absolute_paths: false,
        }
    }
}

/// List the immediate children of `directory`, sorted by name
pub fn list_dir(directory: &Path, options: &ListOptions) -> Result<Vec<DirEntry>> {
    require_directory(directory)?;
    require_some_kind(options.include_files, options.include_dirs)?;
    let filter = PatternSet::compile(&options.patterns, MatchStyle::Loose)?;

    let base = if options.absolute_paths {
        directory.canonicalize()?
    } else {
        directory.to_path_buf()
    };

    let mut children = fs::read_dir(directory)?
        .filter_map(|entry| entry.ok())
        .collect::<Vec<_>>();
    children.sort_by_key(|entry| entry.file_name());

    let mut results = Vec::new();
    for child in children {
        let path = child.path();
        let is_dir = path.is_dir();
        if (is_dir && !options.include_dirs) || (!is_dir && !options.include_files) {
            continue;
        }

        let relative = PathBuf::from(child.file_name());
        if !filter.matches(&to_posix(&relative)) {
            continue;
        }

        let name = child.file_name().to_string_lossy().into_owned();
        results.push(DirEntry {
            path: if options.absolute_paths {
                base.join(&relative)
            } else {
                relative
            },
            name,
            is_dir,
        });
    }

    debug!(
        "Listed {} entries in {}",
        results.len(),
        directory.display()
    );
    Ok(results)
}
