//! Line-oriented text search

use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::patterns::{to_posix, MatchStyle, PatternSet};
use super::{is_probably_binary, require_directory, BINARY_PROBE_BYTES};
use crate::error::{Error, Result};

/// One matched line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub path: PathBuf,
    /// 1-based
    pub line_number: usize,
    /// Line text without its line terminator
    pub line_text: String,
    /// Half-open character ranges of every match kept on this line
    pub spans: Vec<(usize, usize)>,
}

/// Options for [`search_text`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// File globs relative to the root; empty means every file
    pub globs: Vec<String>,
    /// Plain mode only; regex callers embed `(?i)` instead
    pub case_sensitive: bool,
    pub use_regex: bool,
    pub include_binary: bool,
    /// Cap on the total number of spans; `None` is unlimited
    pub max_matches: Option<i64>,
    pub binary_probe_bytes: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            globs: Vec::new(),
            case_sensitive: true,
            use_regex: false,
            include_binary: false,
            max_matches: None,
            binary_probe_bytes: BINARY_PROBE_BYTES,
        }
    }
}

enum Matcher {
    Plain { needle: String, fold_case: bool },
    Pattern(Regex),
}

impl Matcher {
    fn spans(&self, line: &str) -> Vec<(usize, usize)> {
        match self {
            Matcher::Plain { needle, .. } if needle.is_empty() => Vec::new(),
            Matcher::Plain {
                needle,
                fold_case: false,
            } => plain_spans(line, needle),
            Matcher::Plain {
                needle,
                fold_case: true,
            } => plain_spans(&line.to_lowercase(), needle),
            Matcher::Pattern(regex) => regex
                .find_iter(line)
                .map(|m| (char_offset(line, m.start()), char_offset(line, m.end())))
                .collect(),
        }
    }
}

fn plain_spans(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    let width = needle.chars().count();
    haystack
        .match_indices(needle)
        .map(|(byte, _)| {
            let start = char_offset(haystack, byte);
            (start, start + width)
        })
        .collect()
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

/// Search files under `root` for `query`
///
/// Files are visited in sorted path order. Scanning stops once the span cap
/// is reached; the line that crosses the cap keeps only the spans that fit.
pub fn search_text(root: &Path, query: &str, options: &SearchOptions) -> Result<Vec<SearchMatch>> {
    require_directory(root)?;
    let cap = match options.max_matches {
        Some(n) if n < 0 => {
            return Err(Error::invalid_argument(
                "max_matches",
                "must be non-negative or omitted.",
            ))
        }
        Some(n) => Some(n as usize),
        None => None,
    };

    let matcher = if options.use_regex {
        Matcher::Pattern(Regex::new(query)?)
    } else {
        Matcher::Plain {
            needle: if options.case_sensitive {
                query.to_string()
            } else {
                query.to_lowercase()
            },
            fold_case: !options.case_sensitive,
        }
    };

    let filter = PatternSet::compile(&options.globs, MatchStyle::PathAware)?;
    let mut results = Vec::new();
    let mut total = 0usize;

    'files: for file in candidate_files(root, &filter) {
        if !options.include_binary && is_probably_binary(&file, options.binary_probe_bytes) {
            continue;
        }

        let bytes = fs::read(&file)?;
        let content = String::from_utf8(bytes).map_err(|_| Error::Decode { path: file.clone() })?;

        for (idx, line) in content.lines().enumerate() {
            let mut spans = matcher.spans(line);
            if spans.is_empty() {
                continue;
            }

            if let Some(cap) = cap {
                let remaining = cap.saturating_sub(total);
                if remaining == 0 {
                    break 'files;
                }
                spans.truncate(remaining);
            }

            total += spans.len();
            results.push(SearchMatch {
                path: file.clone(),
                line_number: idx + 1,
                line_text: line.to_string(),
                spans,
            });

            if cap.is_some_and(|cap| total >= cap) {
                break 'files;
            }
        }
    }

    debug!(
        "Search under {} found {} matching lines ({} spans)",
        root.display(),
        results.len(),
        total
    );
    Ok(results)
}

/// Regular files under `root` that pass `filter`, in sorted path order
fn candidate_files(root: &Path, filter: &PatternSet) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry during search: {}", e);
                None
            }
        })
        .filter(|entry| entry.path().is_file())
        .filter(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .is_ok_and(|relative| filter.matches(&to_posix(relative)))
        })
        .map(|entry| entry.into_path())
        .collect()
}
