//! Exact-match single-occurrence replacement

use std::fmt;
use std::path::PathBuf;

use super::{char_slice, load_text, write_atomic, Sandbox};
use crate::error::{Error, Result};

/// Default number of characters of context on each side of an edit
pub const SNIPPET_RADIUS: usize = 120;

/// What the edit did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    /// Occurrence `occurrence` of the search string, at chars `[start, end)`
    Replaced {
        occurrence: usize,
        start: usize,
        end: usize,
    },
    /// The file was empty and the replacement became its whole content
    InsertedIntoEmpty,
}

/// Summary of a successful edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditReport {
    pub path: PathBuf,
    pub kind: EditKind,
    /// Change in length, in characters
    pub delta: i64,
    /// New length, in characters
    pub new_size: usize,
    /// Content surrounding the edit
    pub snippet: String,
}

impl fmt::Display for EditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path: {}", self.path.display())?;
        match &self.kind {
            EditKind::Replaced {
                occurrence,
                start,
                end,
            } => writeln!(
                f,
                "Replaced occurrence #{} (chars {}-{})",
                occurrence, start, end
            )?,
            EditKind::InsertedIntoEmpty => {
                writeln!(f, "Inserted into empty file (no search performed)")?
            }
        }
        writeln!(f, "Delta size: {:+} chars", self.delta)?;
        writeln!(f, "New file size: {} chars", self.new_size)?;
        writeln!(f)?;
        writeln!(f, "Snippet around edit:")?;
        write!(f, "{}", self.snippet)
    }
}

/// Replace one occurrence of `old` with `new` and save the file atomically
///
/// Occurrences are found left to right without overlap and `occurrence` picks
/// one by 0-based index. An empty `old` is accepted only for an empty file.
pub fn replace_in_file(
    sandbox: &Sandbox,
    file_path: &str,
    old: &str,
    new: &str,
    occurrence: usize,
    snippet_radius: usize,
) -> Result<EditReport> {
    let path = sandbox.resolve(file_path)?;
    sandbox.ensure_text(&path, "edited")?;
    let original = load_text(&path)?;

    if old.is_empty() {
        if !original.is_empty() {
            return Err(Error::invalid_argument(
                "old_str",
                "empty is only allowed when the file is empty; use a non-empty old_str or a full-file write tool.",
            ));
        }

        write_atomic(&path, new)?;
        let new_size = new.chars().count();
        info!("Wrote {} chars into empty file {}", new_size, path.display());
        return Ok(EditReport {
            path,
            kind: EditKind::InsertedIntoEmpty,
            delta: new_size as i64,
            new_size,
            snippet: char_slice(new, 0, new_size + snippet_radius).to_string(),
        });
    }

    let occurrences: Vec<usize> = original.match_indices(old).map(|(byte, _)| byte).collect();
    if occurrences.is_empty() {
        return Err(Error::NoOccurrence);
    }
    let Some(&byte_start) = occurrences.get(occurrence) else {
        return Err(Error::OccurrenceOutOfRange {
            index: occurrence,
            found: occurrences.len(),
        });
    };
    let byte_end = byte_start + old.len();

    let mut edited = String::with_capacity(original.len() - old.len() + new.len());
    edited.push_str(&original[..byte_start]);
    edited.push_str(new);
    edited.push_str(&original[byte_end..]);

    write_atomic(&path, &edited)?;

    let start = original[..byte_start].chars().count();
    let old_chars = old.chars().count();
    let new_chars = new.chars().count();
    let new_size = edited.chars().count();
    let snippet = char_slice(
        &edited,
        start.saturating_sub(snippet_radius),
        (start + new_chars + snippet_radius).min(new_size),
    )
    .to_string();

    info!(
        "Replaced occurrence #{} in {} ({} -> {} chars)",
        occurrence,
        path.display(),
        old_chars,
        new_chars
    );

    Ok(EditReport {
        path,
        kind: EditKind::Replaced {
            occurrence,
            start,
            end: start + old_chars,
        },
        delta: new_chars as i64 - old_chars as i64,
        new_size,
        snippet,
    })
}
