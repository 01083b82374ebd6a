//! Configuration management for repotools
//!
//! This module provides the configuration model (project root, shell
//! session timing, search and editor limits) and the loader that finds
//! and validates configuration files.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for repotools
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory every file operation is sandboxed to; defaults to the
    /// current working directory
    pub project_root: Option<PathBuf>,

    /// Persistent shell configuration
    pub shell: ShellConfig,

    /// Text search configuration
    pub search: SearchConfig,

    /// Text editor configuration
    pub editor: EditorConfig,
}

impl Config {
    /// Validate value ranges
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.shell.program.trim().is_empty() {
            return Err(ConfigError::EmptyShellProgram);
        }

        let timeouts = [
            ("shell.startup_timeout_ms", self.shell.startup_timeout_ms),
            ("shell.drain_timeout_ms", self.shell.drain_timeout_ms),
            ("shell.command_timeout_ms", self.shell.command_timeout_ms),
            ("shell.settle_timeout_ms", self.shell.settle_timeout_ms),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::ZeroTimeout(field));
            }
        }

        if self.search.binary_probe_bytes == 0 {
            return Err(ConfigError::InvalidProbeSize(self.search.binary_probe_bytes));
        }

        if let Some(root) = &self.project_root {
            if !root.is_dir() {
                return Err(ConfigError::ProjectRootNotADirectory(root.clone()));
            }
        }

        Ok(())
    }

    /// Resolve the project root to a canonical absolute directory
    pub fn resolve_project_root(&self) -> std::result::Result<PathBuf, ConfigError> {
        let root = match &self.project_root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        Ok(root.canonicalize()?)
    }

    /// Override the project root
    pub fn with_project_root(mut self, root: impl AsRef<Path>) -> Self {
        self.project_root = Some(root.as_ref().to_path_buf());
        self
    }
}

/// Persistent shell configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Shell executable
    pub program: String,

    /// Shell arguments; must keep the shell interactive and free of rc files
    pub args: Vec<String>,

    /// Value of TERM inside the session
    pub term: String,

    /// How long to wait for the first prompt
    pub startup_timeout_ms: u64,

    /// Per-probe wait when draining stray prompts before a command
    pub drain_timeout_ms: u64,

    /// How long to wait for the completion sentinel
    pub command_timeout_ms: u64,

    /// How long to wait for the prompt after the sentinel
    pub settle_timeout_ms: u64,

    /// Grace period between `exit` and a forced kill on close
    pub close_grace_ms: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: "/bin/bash".to_string(),
            args: vec![
                "--noprofile".to_string(),
                "--norc".to_string(),
                "--noediting".to_string(),
                "-i".to_string(),
            ],
            term: "dumb".to_string(),
            startup_timeout_ms: 10_000,
            drain_timeout_ms: 50,
            command_timeout_ms: 60_000,
            settle_timeout_ms: 10_000,
            close_grace_ms: 100,
        }
    }
}

impl ShellConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }
}

/// Text search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Occurrence cap used by the grep tool when the caller gives none
    pub default_max_matches: usize,

    /// Number of leading bytes inspected for NUL when detecting binary files
    pub binary_probe_bytes: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_matches: 50,
            binary_probe_bytes: 8192,
        }
    }
}

/// Text editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Characters of context shown on each side of an edit
    pub snippet_radius: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snippet_radius: 120,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Shell program cannot be empty")]
    EmptyShellProgram,

    #[error("Timeout '{0}' must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("Invalid binary probe size: {0} (must be greater than 0)")]
    InvalidProbeSize(usize),

    #[error("Project root is not a directory: {0}")]
    ProjectRootNotADirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Configuration field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::EmptyShellProgram => "shell.program",
            ConfigError::ZeroTimeout(field) => field,
            ConfigError::InvalidProbeSize(_) => "search.binary_probe_bytes",
            ConfigError::ProjectRootNotADirectory(_) | ConfigError::Io(_) => "project_root",
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(err: ConfigError) -> Self {
        crate::error::Error::ConfigValidationFailed {
            field: err.field().to_string(),
            reason: err.to_string(),
        }
    }
}
