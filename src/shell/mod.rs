//! Persistent shell execution
//!
//! - [`session`] - the long-lived shell and its request/response protocol
//! - [`output`] - command framing, output normalization and exit codes

pub mod output;
pub mod session;

pub use output::{extract_exit_code, normalize_output, shell_quote, strip_ansi, Markers};
pub use session::{CommandOutput, SessionInfo, SessionState, ShellSession};
