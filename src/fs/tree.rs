//! Depth-bounded recursive listing

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::patterns::{to_posix, MatchStyle, PatternSet};
use super::{require_directory, require_some_kind};
use crate::error::{Error, Result};

/// Deepest level a tree walk may reach
pub const MAX_TREE_DEPTH: usize = 3;

/// One entry found by [`walk_tree`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    /// Absolute, or relative to the walk root
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    /// Number of path segments below the root; direct children are 1
    pub depth: usize,
}

/// Filters for [`walk_tree`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOptions {
    pub max_depth: usize,
    pub patterns: Vec<String>,
    pub include_files: bool,
    pub include_dirs: bool,
    pub absolute_paths: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_TREE_DEPTH,
            patterns: Vec::new(),
            include_files: true,
            include_dirs: true,
            absolute_paths: false,
        }
    }
}

/// Walk `root` depth-first in name order, up to `max_depth` levels
///
/// Directories are always descended into, even when `include_dirs` hides
/// them. Directories that cannot be read are skipped.
pub fn walk_tree(root: &Path, options: &TreeOptions) -> Result<Vec<TreeEntry>> {
    require_directory(root)?;
    if !(1..=MAX_TREE_DEPTH).contains(&options.max_depth) {
        return Err(Error::invalid_argument(
            "max_depth",
            "must be in the range [1, 3].",
        ));
    }
    require_some_kind(options.include_files, options.include_dirs)?;
    let filter = PatternSet::compile(&options.patterns, MatchStyle::Loose)?;

    let base = if options.absolute_paths {
        root.canonicalize()?
    } else {
        root.to_path_buf()
    };

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(options.max_depth)
        .sort_by_file_name();

    let mut results = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry during tree walk: {}", e);
                continue;
            }
        };

        let is_dir = entry.path().is_dir();
        if (is_dir && !options.include_dirs) || (!is_dir && !options.include_files) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if !filter.matches(&to_posix(relative)) {
            continue;
        }

        results.push(TreeEntry {
            path: if options.absolute_paths {
                base.join(relative)
            } else {
                relative.to_path_buf()
            },
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            depth: entry.depth(),
        });
    }

    Ok(results)
}
