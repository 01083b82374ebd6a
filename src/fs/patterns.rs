//! Glob filters for filesystem queries

use glob::{MatchOptions, Pattern};
use std::path::Path;

use crate::error::Result;

/// How `*` treats path separators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStyle {
    /// `*` may cross `/`, like `fnmatch`
    Loose,
    /// `*` stops at `/` and `**` spans whole directories, like pathlib globbing
    PathAware,
}

impl MatchStyle {
    fn options(self) -> MatchOptions {
        match self {
            MatchStyle::Loose => MatchOptions::new(),
            MatchStyle::PathAware => MatchOptions {
                require_literal_separator: true,
                ..MatchOptions::new()
            },
        }
    }
}

/// A compiled set of glob patterns; an empty set matches everything
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
    options: MatchOptions,
}

impl PatternSet {
    pub fn compile<S: AsRef<str>>(patterns: &[S], style: MatchStyle) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            options: style.options(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether a forward-slash relative path passes the filter
    pub fn matches(&self, relative: &str) -> bool {
        self.is_empty()
            || self
                .patterns
                .iter()
                .any(|p| p.matches_with(relative, self.options))
    }
}

/// Render a relative path with forward slashes
pub fn to_posix(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
