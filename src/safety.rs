//! Command safety filter
//!
//! Static checks applied to every command before it reaches the persistent
//! shell. A command is denied when it uses `sudo`, when it force-removes the
//! filesystem root, or when any token names an administrative program from
//! the deny-list.
//!
//! This is an advisory filter, not a sandbox. It inspects the literal command
//! text only: command substitution, variable expansion, aliases, `eval` and
//! similar obfuscations pass straight through.

use crate::security_audit::log_command_rejected;
use once_cell::sync::Lazy;
use regex::Regex;

/// Administrative programs that may never be invoked
pub const DENIED_PROGRAMS: &[&str] = &[
    "groupadd",
    "groupdel",
    "groupmod",
    "ifdown",
    "ifup",
    "killall",
    "lvremove",
    "mount",
    "passwd",
    "pkill",
    "pvremove",
    "reboot",
    "route",
    "service",
    "shutdown",
    "su",
    "sysctl",
    "systemctl",
    "umount",
    "useradd",
    "userdel",
    "usermod",
    "vgremove",
    "mkfs",
    "fdisk",
    "iptables",
    "ifconfig",
];

static SUDO_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s;&|()])sudo(?:$|[\s;&|()])").expect("valid sudo pattern"));

static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_./-]+").expect("valid word pattern"));

/// Result of checking a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandVerdict {
    /// The command may run
    Allowed,
    /// The command is blocked
    Denied { reason: String },
}

impl CommandVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, CommandVerdict::Allowed)
    }

    /// Denial reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            CommandVerdict::Allowed => None,
            CommandVerdict::Denied { reason } => Some(reason),
        }
    }

    fn denied(reason: impl Into<String>) -> Self {
        CommandVerdict::Denied {
            reason: reason.into(),
        }
    }
}

/// Check a command against the deny rules
pub fn check_command(command: &str) -> CommandVerdict {
    let verdict = evaluate(command);
    if let CommandVerdict::Denied { reason } = &verdict {
        log_command_rejected(command, reason);
    }
    verdict
}

fn evaluate(command: &str) -> CommandVerdict {
    if SUDO_PATTERN.is_match(command) {
        return CommandVerdict::denied("Use of 'sudo' is not allowed.");
    }

    if command
        .split(|c| matches!(c, ';' | '&' | '|' | '\n'))
        .any(removes_root)
    {
        return CommandVerdict::denied("Dangerous removal detected (rm -rf on root).");
    }

    for token in WORD_PATTERN.find_iter(command) {
        let base = token.as_str().rsplit('/').next().unwrap_or_default();
        if DENIED_PROGRAMS.contains(&base) {
            return CommandVerdict::denied(format!("Command '{}' is not permitted.", base));
        }
    }

    CommandVerdict::Allowed
}

/// Whether one simple command is a recursive forced `rm` on `/` or `/*`
fn removes_root(simple_command: &str) -> bool {
    let mut tokens = simple_command.split_whitespace();

    // Skip leading words until the rm invocation
    if !tokens.by_ref().any(|t| t == "rm" || t.ends_with("/rm")) {
        return false;
    }

    let mut recursive = false;
    let mut force = false;
    let mut targets_root = false;
    let mut options_done = false;

    for token in tokens {
        if !options_done && token == "--" {
            options_done = true;
        } else if !options_done && token.starts_with("--") {
            match token {
                "--recursive" => recursive = true,
                "--force" => force = true,
                _ => {}
            }
        } else if !options_done && token.len() > 1 && token.starts_with('-') {
            recursive |= token.contains(['r', 'R']);
            force |= token.contains('f');
        } else if token == "/" || token == "/*" {
            targets_root = true;
        }
    }

    recursive && force && targets_root
}
