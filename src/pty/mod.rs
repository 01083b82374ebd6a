//! Pseudoterminal (PTY) Management
//!
//! This module provides the pseudoterminal plumbing underneath the
//! persistent shell: process spawning, reaping, and the thread-to-async
//! bridge for the PTY byte stream.

pub mod process;
pub mod streams;

// Re-exports for convenience
pub use process::{spawn_pty_process, PtyChild, SpawnConfig};
pub use streams::{PtyStreams, ReadOutcome, StreamStats};
