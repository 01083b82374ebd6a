//! Output framing and normalization for the persistent shell
//!
//! The shell speaks an unframed byte stream. Commands are wrapped so the
//! shell prints a unique sentinel after they finish, and the text captured
//! before that sentinel is cleaned up here.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use uuid::Uuid;

/// Marker printed before the exit status of a caller-supplied command
pub const EXIT_MARKER: &str = "__REPOTOOLS_EXIT";

/// Marker printed before the shell's working directory after a command
pub const CWD_MARKER: &str = "__REPOTOOLS_CWD";

static ANSI_CSI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("valid CSI pattern"));

static EXIT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^__REPOTOOLS_EXIT:(\d+)$").expect("valid exit line pattern"));

/// Unique strings that frame one session's traffic
///
/// Each marker is also kept as two halves. The halves are what gets typed
/// into the shell, quoted separately, so the terminal echo of an instruction
/// never contains the marker itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    prompt: String,
    done: String,
    prompt_split: usize,
    done_split: usize,
}

impl Markers {
    /// Generate fresh markers for a new session
    pub fn generate() -> Self {
        let id = Uuid::new_v4().simple().to_string();
        let tag = &id[..12];
        Self::with_tag(tag)
    }

    fn with_tag(tag: &str) -> Self {
        let prompt = format!("__REPOTOOLS_PS1_{}__> ", tag);
        let done = format!("__REPOTOOLS_DONE_{}__", tag);
        Self {
            prompt_split: prompt.len() / 2,
            done_split: done.len() / 2,
            prompt,
            done,
        }
    }

    /// Prompt string the shell prints when idle
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Sentinel printed after every framed command
    pub fn done(&self) -> &str {
        &self.done
    }

    /// Instruction that installs the prompt and turns off echo, history
    /// expansion and the continuation prompt
    pub fn setup_line(&self) -> String {
        let (a, b) = self.prompt.split_at(self.prompt_split);
        format!(
            "stty -echo 2>/dev/null; set +H; PS1='{}''{}'; PS2=''; unset PROMPT_COMMAND\n",
            a, b
        )
    }

    /// Wrap `body` so it runs in the current shell with stderr merged and is
    /// followed by the sentinel on its own line
    pub fn frame(&self, body: &str) -> String {
        let (a, b) = self.done.split_at(self.done_split);
        format!(
            "{{ {}\n}} 2>&1; printf '\\n%s%s\\n' '{}' '{}'\n",
            body, a, b
        )
    }
}

/// Append the exit status and working directory report to a caller-supplied
/// command
pub fn with_exit_report(command: &str) -> String {
    format!(
        "{}\nprintf '\\n%s:%s\\n%s:%s\\n' '{}' \"$?\" '{}' \"$PWD\"",
        command, EXIT_MARKER, CWD_MARKER
    )
}

/// Clean up raw captured output
///
/// Prompt occurrences, an echoed command line, trailing blank lines, trailing
/// whitespace and ANSI CSI sequences are removed.
pub fn normalize_output(raw: &str, command: &str, prompt: &str) -> String {
    let without_prompt = if prompt.is_empty() {
        raw.to_string()
    } else {
        raw.replace(prompt, "")
    };

    let mut lines: Vec<&str> = without_prompt.split('\n').collect();
    if lines
        .first()
        .is_some_and(|first| first.trim() == command.trim())
    {
        lines.remove(0);
    }
    while lines.last().is_some_and(|last| last.trim().is_empty()) {
        lines.pop();
    }

    let joined = lines
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");

    strip_ansi(joined.trim())
}

/// Remove ANSI CSI escape sequences
pub fn strip_ansi(text: &str) -> String {
    ANSI_CSI.replace_all(text, "").into_owned()
}

/// Split the exit status report off normalized output
///
/// The last line of the form `__REPOTOOLS_EXIT:<n>` is removed and parsed.
/// Output without such a line is returned unchanged with no exit code.
pub fn extract_exit_code(output: &str) -> (String, Option<i32>) {
    let lines: Vec<&str> = output.split('\n').collect();
    let found = lines.iter().enumerate().rev().find_map(|(idx, line)| {
        EXIT_LINE
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .map(|code| (idx, code))
    });

    match found {
        Some((idx, code)) => {
            let remaining = lines
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, line)| *line)
                .collect::<Vec<_>>()
                .join("\n");
            (remaining.trim().to_string(), Some(code))
        }
        None => (output.to_string(), None),
    }
}

/// Split the working directory report off output
///
/// Only a report on the last line counts; anything else is left in place.
pub fn extract_cwd(output: &str) -> (String, Option<PathBuf>) {
    let prefix = format!("{}:", CWD_MARKER);
    let (head, last) = match output.rsplit_once('\n') {
        Some((head, last)) => (head, last),
        None => ("", output),
    };
    match last.strip_prefix(prefix.as_str()) {
        Some(dir) if !dir.is_empty() => (head.trim_end().to_string(), Some(PathBuf::from(dir))),
        _ => (output.to_string(), None),
    }
}

/// Drop the `exit` line an interactive shell prints when it logs out
pub fn strip_logout_echo(output: &str) -> String {
    match output.rsplit_once('\n') {
        Some((head, "exit")) => head.trim_end().to_string(),
        None if output == "exit" => String::new(),
        _ => output.to_string(),
    }
}

/// Quote a value as a single-quoted shell word
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
