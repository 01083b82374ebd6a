//! repotools - Safe, structured repository tools for coding agents
//!
//! This library gives an agent a small set of tools for working inside one
//! project directory: a persistent shell, text search, directory listing,
//! and exact-match file editing. Every tool result is plain text; failures
//! are rendered as text beginning with `Error: ` instead of being raised.
//!
//! ## Module Organization
//!
//! ### Shell
//!
//! - [`pty`] - PTY process spawning and byte streams via `portable-pty`
//! - [`shell`] - Persistent interactive bash session with sentinel framing
//! - [`safety`] - Deny rules applied to commands before they run
//!
//! ### Filesystem
//!
//! - [`fs`] - Directory listing, bounded tree walks, and text search
//! - [`editor`] - Sandboxed file viewing and single-occurrence replacement
//!
//! ### Surface
//!
//! - [`tools`] - Text-rendering facade and the named tool registry
//! - [`config`] - TOML configuration and its loader
//! - [`security_audit`] - Structured audit logging of rejected or suspicious requests
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use repotools::{Toolbox, ToolRegistry};
//! use std::sync::Arc;
//!
//! # async fn run() -> repotools::Result<()> {
//! let toolbox = Arc::new(Toolbox::with_root(".")?);
//! let registry = ToolRegistry::with_defaults(toolbox);
//!
//! let listing = registry.dispatch("ls", serde_json::json!({})).await;
//! println!("{}", listing);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The shell runs in a PTY owned by a single [`shell::ShellSession`]. Blocking
//! PTY reads and writes happen on dedicated threads and are bridged to the
//! async session through channels. Requests to the shell are serialized; a
//! session that exits or times out is replaced on the next request.
//!
//! ## Safety
//!
//! - Commands are checked against a deny-list before reaching the shell
//! - Editor paths are canonicalized and must stay inside the project root
//! - Binary files are never viewed or edited
//! - Edits are written through a temporary file and renamed into place

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod security_audit;

// Shell
pub mod pty;
pub mod safety;
pub mod shell;

// Filesystem
pub mod editor;
pub mod fs;

// Surface
pub mod tools;

// Re-exports for core functionality
pub use config::loader::ConfigLoader;
pub use config::Config;
pub use error::{Error, Result};
pub use safety::{check_command, CommandVerdict};
pub use shell::{CommandOutput, ShellSession};
pub use tools::{Tool, ToolRegistry, Toolbox};

// Version information
/// The current version of repotools from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The crate name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Build the default tool registry for `config`
///
/// Loading a configuration file is left to the caller; see [`ConfigLoader`].
pub fn init(config: &Config) -> Result<ToolRegistry> {
    info!("Initializing {} v{}", NAME, VERSION);
    config.validate()?;
    let toolbox = std::sync::Arc::new(Toolbox::new(config)?);
    Ok(ToolRegistry::with_defaults(toolbox))
}
