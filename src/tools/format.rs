//! Plain-text rendering of tool results

use std::fmt::Display;

use crate::error::{Error, Result};
use crate::fs::{DirEntry, SearchMatch, TreeEntry};
use crate::shell::CommandOutput;

/// Prefix every failed tool result starts with
pub const ERROR_PREFIX: &str = "Error: ";

pub fn render_error(err: &Error) -> String {
    format!("{}{}", ERROR_PREFIX, err)
}

/// Render a result, turning errors into `Error: ...` text
pub fn render<T: Display>(result: Result<T>) -> String {
    match result {
        Ok(value) => value.to_string(),
        Err(e) => render_error(&e),
    }
}

/// `path:line: text` per matched line
pub fn format_matches(matches: &[SearchMatch]) -> String {
    if matches.is_empty() {
        return "No matches found.".to_string();
    }
    matches
        .iter()
        .map(|m| format!("{}:{}: {}", m.path.display(), m.line_number, m.line_text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn kind_tag(is_dir: bool) -> &'static str {
    if is_dir {
        "[D]"
    } else {
        "[F]"
    }
}

/// `[D]/[F] name — path` per entry
pub fn format_entries(entries: &[DirEntry]) -> String {
    if entries.is_empty() {
        return "(empty)".to_string();
    }
    entries
        .iter()
        .map(|e| format!("{} {} — {}", kind_tag(e.is_dir), e.name, e.path.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Like [`format_entries`], indented two spaces per level below the first
pub fn format_tree(entries: &[TreeEntry]) -> String {
    if entries.is_empty() {
        return "(empty)".to_string();
    }
    entries
        .iter()
        .map(|e| {
            format!(
                "{}{} {} — {}",
                "  ".repeat(e.depth.saturating_sub(1)),
                kind_tag(e.is_dir),
                e.name,
                e.path.display()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Command output, or a failure line with the exit code above the output
pub fn format_command_output(result: &CommandOutput) -> String {
    match result.exit_code {
        Some(code) if code != 0 => {
            if result.output.is_empty() {
                format!("{}command failed with exit code {}", ERROR_PREFIX, code)
            } else {
                format!(
                    "{}command failed with exit code {}\n{}",
                    ERROR_PREFIX, code, result.output
                )
            }
        }
        _ => result.output.clone(),
    }
}
