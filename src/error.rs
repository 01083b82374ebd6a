//! Error types and Result aliases for repotools

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for repotools operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for repotools
#[derive(Debug)]
pub enum Error {
    // === Validation errors ===
    /// A tool argument had the wrong shape or range
    InvalidArgument {
        name: String,
        reason: String,
    },

    /// Empty command
    EmptyCommand,

    // === Sandbox errors ===
    /// Path resolves outside the project root
    PathOutsideRoot {
        path: PathBuf,
        root: PathBuf,
    },

    /// File does not exist
    FileNotFound {
        path: PathBuf,
    },

    /// Directory does not exist
    DirectoryNotFound {
        path: PathBuf,
    },

    /// Path exists but is not a regular file
    NotAFile {
        path: PathBuf,
    },

    /// Path exists but is not a directory
    NotADirectory {
        path: PathBuf,
    },

    /// File looks binary and cannot be handled as text
    BinaryFile {
        path: PathBuf,
        action: &'static str,
    },

    // === Edit lookup errors ===
    /// Search string does not occur in the file
    NoOccurrence,

    /// Requested occurrence index is past the last occurrence
    OccurrenceOutOfRange {
        index: usize,
        found: usize,
    },

    // === Shell errors ===
    /// Command blocked by the safety filter
    CommandRejected {
        reason: String,
    },

    /// Command did not complete before the sentinel timeout
    CommandTimeout {
        command: String,
        duration: Duration,
    },

    /// Shell session is closed or unusable
    SessionClosed,

    /// Shell did not show its prompt during startup
    ShellStartupFailed {
        program: String,
        reason: String,
    },

    /// Failed to create PTY
    PtyCreationFailed {
        command: String,
        reason: String,
    },

    /// Failed to spawn command in PTY
    CommandSpawnFailed {
        command: String,
        reason: String,
    },

    /// Failed to clone PTY reader
    PtyReaderCloneFailed {
        reason: String,
    },

    /// Failed to take PTY writer
    PtyWriterTakeFailed {
        reason: String,
    },

    /// Failed to send input to PTY
    PtyInputSendFailed {
        reason: String,
    },

    // === Tool dispatch errors ===
    /// No tool registered under this name
    UnknownTool {
        name: String,
    },

    /// Tool parameters did not deserialize
    InvalidParameters {
        tool: String,
        reason: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Configuration validation failed
    ConfigValidationFailed {
        field: String,
        reason: String,
    },

    // === I/O, decoding and parsing errors ===
    /// I/O errors
    Io(std::io::Error),

    /// File content is not valid text in the expected encoding
    Decode {
        path: PathBuf,
    },

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    /// Glob pattern errors
    Pattern(glob::PatternError),

    // === Generic fallback (use sparingly) ===
    /// Generic errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Validation errors
            Error::InvalidArgument { name, reason } => {
                write!(f, "{} {}", name, reason)
            }
            Error::EmptyCommand => {
                write!(f, "command must be a non-empty string.")
            }

            // Sandbox errors
            Error::PathOutsideRoot { path, root } => {
                write!(
                    f,
                    "file_path '{}' is outside the project root '{}'.",
                    path.display(),
                    root.display()
                )
            }
            Error::FileNotFound { path } => {
                write!(f, "file not found: {}", path.display())
            }
            Error::DirectoryNotFound { path } => {
                write!(f, "Directory not found: {}", path.display())
            }
            Error::NotAFile { path } => {
                write!(f, "not a file: {}", path.display())
            }
            Error::NotADirectory { path } => {
                write!(f, "Not a directory: {}", path.display())
            }
            Error::BinaryFile { path, action } => {
                write!(
                    f,
                    "file appears to be binary and cannot be {} as text: {}",
                    action,
                    path.display()
                )
            }

            // Edit lookup errors
            Error::NoOccurrence => {
                write!(f, "old_str not found in file; no changes applied.")
            }
            Error::OccurrenceOutOfRange { index, found } => {
                write!(
                    f,
                    "occurrence_index {} out of range; found {} occurrence(s).",
                    index, found
                )
            }

            // Shell errors
            Error::CommandRejected { reason } => write!(f, "{}", reason),
            Error::CommandTimeout { command, duration } => {
                write!(f, "Command '{}' timed out after {:?}", command, duration)
            }
            Error::SessionClosed => {
                write!(f, "Shell session is closed")
            }
            Error::ShellStartupFailed { program, reason } => {
                write!(f, "Failed to start shell '{}': {}", program, reason)
            }
            Error::PtyCreationFailed { command, reason } => {
                write!(f, "Failed to create PTY for command '{}': {}", command, reason)
            }
            Error::CommandSpawnFailed { command, reason } => {
                write!(f, "Failed to spawn command '{}': {}", command, reason)
            }
            Error::PtyReaderCloneFailed { reason } => {
                write!(f, "Failed to clone PTY reader: {}", reason)
            }
            Error::PtyWriterTakeFailed { reason } => {
                write!(f, "Failed to take PTY writer: {}", reason)
            }
            Error::PtyInputSendFailed { reason } => {
                write!(f, "Failed to send input to PTY: {}", reason)
            }

            // Tool dispatch errors
            Error::UnknownTool { name } => write!(f, "unknown tool '{}'", name),
            Error::InvalidParameters { tool, reason } => {
                write!(f, "invalid parameters for '{}': {}", tool, reason)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigValidationFailed { field, reason } => {
                write!(f, "Configuration validation failed for '{}': {}", field, reason)
            }

            // I/O, decoding and parsing errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Decode { path } => {
                write!(f, "unable to decode file with encoding 'utf-8': {}", path.display())
            }
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),
            Error::Pattern(err) => write!(f, "Invalid glob pattern: {}", err),

            // Generic fallback
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Shorthand for an argument validation failure
    pub fn invalid_argument(name: &str, reason: &str) -> Self {
        Error::InvalidArgument {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error leaves the shell session in an unknown state
    pub fn desynchronizes_session(&self) -> bool {
        matches!(
            self,
            Error::CommandTimeout { .. } | Error::PtyInputSendFailed { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<glob::PatternError> for Error {
    fn from(err: glob::PatternError) -> Self {
        Error::Pattern(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
