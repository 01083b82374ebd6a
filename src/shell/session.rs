//! Persistent Shell Session
//!
//! Request/response execution over one long-lived interactive shell. The
//! shell runs in a PTY; its output is an unframed byte stream, so every
//! command is followed by a unique sentinel and the session reads until it
//! sees that sentinel, then waits for the prompt to come back.
//!
//! A session runs at most one command at a time (`&mut self`). Callers that
//! share a session across tasks must serialize access themselves.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

use super::output::{
    extract_cwd, extract_exit_code, normalize_output, shell_quote, strip_logout_echo,
    with_exit_report, Markers,
};
use crate::config::ShellConfig;
use crate::error::{Error, Result};
use crate::pty::{spawn_pty_process, PtyChild, PtyStreams, ReadOutcome, SpawnConfig};
use crate::security_audit::{log_shell_closed, log_shell_started};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Spawned, waiting for the first prompt
    Starting,
    /// Idle at the prompt
    Ready,
    /// A command has been written and its sentinel not yet seen
    Executing,
    /// Shell exited or was shut down
    Closed,
}

/// Result of running a caller-supplied command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// stdout and stderr interleaved, normalized
    pub output: String,
    /// Exit status; `None` when it could not be determined
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code.unwrap_or(0) == 0
    }
}

/// Snapshot of session metadata
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub pid: Option<u32>,
    pub state: SessionState,
    pub started_at: DateTime<Utc>,
    pub commands_run: u64,
    pub cwd: Option<PathBuf>,
}

/// Outcome of waiting for a byte pattern in the stream
#[derive(Debug)]
enum Expect {
    /// Found; carries everything before the pattern
    Matched(Vec<u8>),
    /// Deadline passed; buffered bytes are kept
    TimedOut,
    /// Stream ended; carries whatever was left in the buffer
    Closed(Vec<u8>),
}

/// Raw result of one framed round trip
struct Framed {
    text: String,
    /// Exit status of the shell itself when it exited mid-command
    shell_exit: Option<i32>,
}

/// One long-lived interactive shell
pub struct ShellSession {
    config: ShellConfig,
    markers: Markers,
    child: PtyChild,
    streams: PtyStreams,
    pending: Vec<u8>,
    state: SessionState,
    commands_run: u64,
    cwd: Option<PathBuf>,
}

impl ShellSession {
    /// Spawn the shell, install the prompt and wait until it is responsive
    ///
    /// When `cwd` is given the session changes into it before returning.
    pub async fn start(config: &ShellConfig, cwd: Option<&Path>) -> Result<Self> {
        let mut env = HashMap::new();
        env.insert("TERM".to_string(), config.term.clone());

        let spawn_config = SpawnConfig {
            program: config.program.clone(),
            args: config.args.clone(),
            env,
            working_directory: cwd.map(Path::to_path_buf),
            ..SpawnConfig::default()
        };

        let (child, streams) = spawn_pty_process(&spawn_config)?;
        let mut session = Self {
            config: config.clone(),
            markers: Markers::generate(),
            child,
            streams,
            pending: Vec::new(),
            state: SessionState::Starting,
            commands_run: 0,
            cwd: None,
        };

        let setup = session.markers.setup_line();
        session.streams.write(setup.as_bytes())?;

        let prompt = session.markers.prompt().as_bytes().to_vec();
        match session.expect(&prompt, config.startup_timeout()).await {
            Expect::Matched(_) => {}
            Expect::TimedOut => {
                session.close();
                return Err(Error::ShellStartupFailed {
                    program: config.program.clone(),
                    reason: format!("no prompt within {:?}", config.startup_timeout()),
                });
            }
            Expect::Closed(rest) => {
                session.close();
                return Err(Error::ShellStartupFailed {
                    program: config.program.clone(),
                    reason: format!(
                        "shell exited during startup: {}",
                        String::from_utf8_lossy(&rest).trim()
                    ),
                });
            }
        }

        session.state = SessionState::Ready;
        log_shell_started(&config.program, session.child.pid());

        if let Some(dir) = cwd {
            session.change_dir(dir).await?;
        }

        Ok(session)
    }

    /// Run a caller-supplied command and report its exit status
    pub async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        let framed = self.round_trip(command, &with_exit_report(command)).await?;
        let normalized = normalize_output(&framed.text, command, self.markers.prompt());
        let (output, exit_code) = extract_exit_code(&normalized);
        let (output, cwd) = extract_cwd(&output);
        if let Some(cwd) = cwd {
            self.cwd = Some(cwd);
        }

        let output = match framed.shell_exit {
            Some(_) => strip_logout_echo(&output),
            None => output,
        };

        Ok(CommandOutput {
            output,
            exit_code: exit_code.or(framed.shell_exit),
        })
    }

    /// Run a command without an exit status report and return its output
    pub async fn execute(&mut self, command: &str) -> Result<String> {
        let framed = self.round_trip(command, command).await?;
        Ok(normalize_output(&framed.text, command, self.markers.prompt()))
    }

    /// Ask the shell for its working directory
    pub async fn getcwd(&mut self) -> Result<PathBuf> {
        let output = self.execute("pwd").await?;
        let cwd = PathBuf::from(output.trim());
        self.cwd = Some(cwd.clone());
        Ok(cwd)
    }

    /// Change the shell's working directory
    pub async fn change_dir(&mut self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            return Err(Error::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let command = format!("cd {}", shell_quote(&dir.to_string_lossy()));
        let output = self.execute(&command).await?;
        if !output.is_empty() {
            return Err(Error::Other(output));
        }

        self.getcwd().await?;
        Ok(())
    }

    /// Whether the session can accept another command
    pub fn is_alive(&mut self) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }
        matches!(self.child.try_wait(), Ok(None))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Working directory reported after the last command
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            pid: self.child.pid(),
            state: self.state,
            started_at: self.child.started_at(),
            commands_run: self.commands_run,
            cwd: self.cwd.clone(),
        }
    }

    /// Ask the shell to exit, kill it after the grace period, and reap it
    ///
    /// Closing a closed session is a no-op.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed && self.child.exit_code().is_some() {
            return;
        }

        if self.state != SessionState::Closed {
            if let Err(e) = self.streams.write(b"exit\n") {
                debug!("Could not send exit to shell: {}", e);
            }
        }

        self.child.shutdown(self.config.close_grace());
        self.mark_closed();
    }

    fn mark_closed(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        let lifetime = Utc::now() - self.child.started_at();
        log_shell_closed(lifetime.num_seconds(), self.commands_run);
    }

    /// Write one framed command and read its output up to the sentinel
    async fn round_trip(&mut self, command: &str, body: &str) -> Result<Framed> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Executing => {
                // A previous caller gave up mid-command; framing is lost
                warn!("Shell session was left mid-command, closing it");
                self.close();
                return Err(Error::SessionClosed);
            }
            SessionState::Starting | SessionState::Closed => return Err(Error::SessionClosed),
        }

        self.drain_prompts().await?;

        self.state = SessionState::Executing;
        self.commands_run += 1;
        debug!("Executing command #{} in shell", self.commands_run);

        let framed = self.markers.frame(body);
        if let Err(e) = self.streams.write(framed.as_bytes()) {
            self.close();
            return Err(e);
        }

        let done = self.markers.done().as_bytes().to_vec();
        let captured = match self.expect(&done, self.config.command_timeout()).await {
            Expect::Matched(before) => before,
            Expect::TimedOut => {
                warn!(
                    "Command did not finish within {:?}, closing shell session",
                    self.config.command_timeout()
                );
                self.close();
                return Err(Error::CommandTimeout {
                    command: command.to_string(),
                    duration: self.config.command_timeout(),
                });
            }
            Expect::Closed(rest) => {
                self.child.shutdown(self.config.close_grace());
                self.mark_closed();
                let shell_exit = self.child.exit_code();
                info!("Shell exited during command (exit code {:?})", shell_exit);
                return Ok(Framed {
                    text: String::from_utf8_lossy(&rest).into_owned(),
                    shell_exit,
                });
            }
        };

        let prompt = self.markers.prompt().as_bytes().to_vec();
        match self.expect(&prompt, self.config.settle_timeout()).await {
            Expect::Matched(_) => self.state = SessionState::Ready,
            Expect::TimedOut => {
                warn!("Shell prompt did not return after command, closing shell session");
                self.close();
            }
            Expect::Closed(_) => {
                self.child.shutdown(self.config.close_grace());
                self.mark_closed();
            }
        }

        Ok(Framed {
            text: String::from_utf8_lossy(&captured).into_owned(),
            shell_exit: None,
        })
    }

    /// Discard prompt occurrences already sitting in the stream
    async fn drain_prompts(&mut self) -> Result<()> {
        let prompt = self.markers.prompt().as_bytes().to_vec();
        loop {
            match self.expect(&prompt, self.config.drain_timeout()).await {
                Expect::Matched(_) => continue,
                Expect::TimedOut => return Ok(()),
                Expect::Closed(_) => {
                    self.child.shutdown(self.config.close_grace());
                    self.mark_closed();
                    return Err(Error::SessionClosed);
                }
            }
        }
    }

    /// Read until `needle` appears in the stream or `timeout` elapses
    async fn expect(&mut self, needle: &[u8], timeout: Duration) -> Expect {
        let deadline = Instant::now() + timeout;
        // Bytes before `scanned` are known not to start a match
        let mut scanned = 0;
        loop {
            if let Some(pos) = find_subslice(&self.pending[scanned..], needle) {
                let pos = scanned + pos;
                let before = self.pending[..pos].to_vec();
                self.pending.drain(..pos + needle.len());
                return Expect::Matched(before);
            }
            scanned = self
                .pending
                .len()
                .saturating_sub(needle.len().saturating_sub(1));

            match self.streams.read_until(deadline).await {
                ReadOutcome::Data(bytes) => self.pending.extend_from_slice(&bytes),
                ReadOutcome::TimedOut => return Expect::TimedOut,
                ReadOutcome::Closed => return Expect::Closed(std::mem::take(&mut self.pending)),
            }
        }
    }
}

impl std::fmt::Debug for ShellSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellSession")
            .field("child", &self.child)
            .field("state", &self.state)
            .field("commands_run", &self.commands_run)
            .field("cwd", &self.cwd)
            .field("streams", &self.streams)
            .finish()
    }
}

impl Drop for ShellSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
