//! Security Audit Logging
//!
//! This module provides security audit logging for events around command
//! execution and the file sandbox.
//!
//! ## Security Policy
//!
//! - Command text is truncated and stripped of control characters before it
//!   is logged, never logged in full
//! - File contents are never logged, only paths
//! - Use INFO level for normal events, WARN for suspicious activity
//!
//! ## Events Logged
//!
//! - Commands rejected by the safety filter
//! - Paths that escape the project root
//! - Shell session start/end
//! - Configuration loads/errors

use tracing::{info, warn};

/// Maximum number of characters of command text kept in audit entries
const MAX_COMMAND_CHARS: usize = 80;

/// Security audit event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    /// Command blocked before reaching the shell
    CommandRejected,
    /// Path resolved outside the project root
    SandboxViolation,
    /// Persistent shell started
    ShellStarted,
    /// Persistent shell closed
    ShellClosed,
    /// Configuration file loaded
    ConfigLoaded,
    /// Configuration file error
    ConfigError,
}

impl SecurityEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> &'static str {
        match self {
            SecurityEvent::CommandRejected => "Command rejected by safety filter",
            SecurityEvent::SandboxViolation => "Path outside project root rejected",
            SecurityEvent::ShellStarted => "Persistent shell started",
            SecurityEvent::ShellClosed => "Persistent shell closed",
            SecurityEvent::ConfigLoaded => "Configuration loaded successfully",
            SecurityEvent::ConfigError => "Configuration loading error",
        }
    }

    /// Check if this event is suspicious and should trigger warnings
    pub fn is_suspicious(&self) -> bool {
        matches!(
            self,
            SecurityEvent::CommandRejected | SecurityEvent::SandboxViolation
        )
    }
}

/// Log a security audit event
///
/// Metadata must not contain file contents or untruncated command text.
pub fn log_security_event(event: SecurityEvent, metadata: Option<&str>) {
    let event_desc = event.description();

    let log_message = if let Some(meta) = metadata {
        format!("SECURITY AUDIT: {} | {}", event_desc, meta)
    } else {
        format!("SECURITY AUDIT: {}", event_desc)
    };

    if event.is_suspicious() {
        warn!("{}", log_message);
    } else {
        info!("{}", log_message);
    }
}

/// Log a command denied by the safety filter
pub fn log_command_rejected(command: &str, reason: &str) {
    log_security_event(
        SecurityEvent::CommandRejected,
        Some(&format!(
            "command=\"{}\" reason=\"{}\"",
            sanitize_command(command),
            reason
        )),
    );
}

/// Log a path that escaped the project root
pub fn log_sandbox_violation(path: &str) {
    log_security_event(
        SecurityEvent::SandboxViolation,
        Some(&format!("path=\"{}\"", sanitize_command(path))),
    );
}

/// Log shell session start
pub fn log_shell_started(program: &str, pid: Option<u32>) {
    let pid = pid.map_or_else(|| "unknown".to_string(), |p| p.to_string());
    log_security_event(
        SecurityEvent::ShellStarted,
        Some(&format!("program={} pid={}", program, pid)),
    );
}

/// Log shell session end
pub fn log_shell_closed(duration_secs: i64, commands_run: u64) {
    log_security_event(
        SecurityEvent::ShellClosed,
        Some(&format!(
            "duration={}s commands={}",
            duration_secs, commands_run
        )),
    );
}

/// Sanitize command text to prevent log injection and bound its length
fn sanitize_command(command: &str) -> String {
    let mut sanitized: String = command
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .filter(|c| *c != '"')
        .take(MAX_COMMAND_CHARS)
        .collect();
    if command.chars().count() > MAX_COMMAND_CHARS {
        sanitized.push_str("...");
    }
    sanitized
}
