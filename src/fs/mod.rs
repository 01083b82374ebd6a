//! Filesystem queries
//!
//! Stateless listing, bounded tree walks and line-oriented text search.
//! Every function validates its directory argument first and never writes.

pub mod list;
pub mod patterns;
pub mod search;
pub mod tree;

pub use list::{list_dir, DirEntry, ListOptions};
pub use patterns::{MatchStyle, PatternSet};
pub use search::{search_text, SearchMatch, SearchOptions};
pub use tree::{walk_tree, TreeEntry, TreeOptions};

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default number of leading bytes inspected by [`is_probably_binary`]
pub const BINARY_PROBE_BYTES: usize = 8192;

/// Heuristic binary check: a NUL byte within the first `probe` bytes
///
/// Unreadable files are reported as text so the caller's own read surfaces
/// the real error.
pub fn is_probably_binary(path: &Path, probe: usize) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut chunk = Vec::with_capacity(probe.min(BINARY_PROBE_BYTES));
    match file.take(probe as u64).read_to_end(&mut chunk) {
        Ok(_) => chunk.contains(&0),
        Err(_) => false,
    }
}

/// Ensure `path` is an existing directory
pub(crate) fn require_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::DirectoryNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(Error::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

pub(crate) fn require_some_kind(include_files: bool, include_dirs: bool) -> Result<()> {
    if !include_files && !include_dirs {
        return Err(Error::invalid_argument(
            "include_files/include_dirs",
            "are both false; at least one must be true.",
        ));
    }
    Ok(())
}
