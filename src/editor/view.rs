//! Bounded file viewing

use std::fmt;
use std::path::PathBuf;

use super::{load_text, Sandbox};
use crate::error::{Error, Result};

/// Optional slicing for [`view_file`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewRange {
    /// 1-based, inclusive
    pub start_line: Option<i64>,
    /// 1-based, inclusive
    pub end_line: Option<i64>,
    /// Character budget for the returned content; negative means unlimited
    pub max_chars: Option<i64>,
}

impl ViewRange {
    fn validate(&self) -> Result<()> {
        if self.start_line.is_some_and(|s| s <= 0) {
            return Err(Error::invalid_argument(
                "start_line",
                "must be a positive integer if provided.",
            ));
        }
        if self.end_line.is_some_and(|e| e <= 0) {
            return Err(Error::invalid_argument(
                "end_line",
                "must be a positive integer if provided.",
            ));
        }
        if let (Some(s), Some(e)) = (self.start_line, self.end_line) {
            if e < s {
                return Err(Error::invalid_argument(
                    "end_line",
                    "must be greater than or equal to start_line.",
                ));
            }
        }
        Ok(())
    }
}

/// A slice of a text file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileView {
    pub path: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
    pub total_lines: usize,
    pub content: String,
    pub truncated: bool,
}

impl fmt::Display for FileView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path: {}", self.path.display())?;
        writeln!(
            f,
            "Lines: {}-{} (total {})",
            self.start_line, self.end_line, self.total_lines
        )?;
        if self.truncated {
            writeln!(f, "Note: content truncated due to max_characters limit.")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.content)
    }
}

/// Read a file inside the sandbox, optionally sliced and truncated
///
/// Line bounds past either end are clamped. Line terminators are kept, so an
/// unsliced view reproduces the file byte for byte.
pub fn view_file(sandbox: &Sandbox, file_path: &str, range: ViewRange) -> Result<FileView> {
    let path = sandbox.resolve(file_path)?;
    sandbox.ensure_text(&path, "viewed")?;
    range.validate()?;
    let text = load_text(&path)?;

    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let total_lines = lines.len();
    let start_line = range.start_line.map_or(1, |s| s as usize).max(1);
    let end_line = range
        .end_line
        .map_or(total_lines, |e| e as usize)
        .min(total_lines);

    let mut content = if start_line <= end_line {
        lines[start_line - 1..end_line].concat()
    } else {
        String::new()
    };

    let mut truncated = false;
    if let Some(limit) = range.max_chars.filter(|m| *m >= 0) {
        let limit = limit as usize;
        if let Some((byte, _)) = content.char_indices().nth(limit) {
            content.truncate(byte);
            truncated = true;
        }
    }

    Ok(FileView {
        path,
        start_line,
        end_line,
        total_lines,
        content,
        truncated,
    })
}
