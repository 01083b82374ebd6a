//! PTY Process Spawning
//!
//! Handles the creation and spawning of the shell inside a pseudoterminal
//! using the portable-pty crate, and owns the resulting child handle.

use chrono::{DateTime, Utc};
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::unbounded_channel;

use super::streams::PtyStreams;
use crate::error::{Error, Result};

/// Process spawning configuration
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Program to execute
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Extra environment variables (the parent environment is inherited)
    pub env: HashMap<String, String>,
    /// Working directory
    pub working_directory: Option<PathBuf>,
    /// Terminal size
    pub size: PtySize,
}

impl SpawnConfig {
    /// Create a spawn configuration for `program` with default terminal size
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            ..Self::default()
        }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            env: HashMap::new(),
            working_directory: None,
            // Wide enough that long command lines are not wrapped by the tty
            size: PtySize {
                rows: 48,
                cols: 512,
                pixel_width: 0,
                pixel_height: 0,
            },
        }
    }
}

/// A running process attached to a PTY
///
/// Holds the master side of the terminal for as long as the process is
/// supposed to live. Dropping the master hangs up the terminal.
pub struct PtyChild {
    child: Box<dyn Child + Send + Sync>,
    _master: Box<dyn MasterPty + Send>,
    pid: Option<u32>,
    started_at: DateTime<Utc>,
    exit_code: Option<i32>,
}

impl std::fmt::Debug for PtyChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyChild")
            .field("pid", &self.pid)
            .field("started_at", &self.started_at)
            .field("exit_code", &self.exit_code)
            .finish()
    }
}

impl PtyChild {
    /// OS process identifier
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// When the process was spawned
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Exit code, once the process has been reaped
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Poll the process without blocking; returns the exit code if it has exited
    pub fn try_wait(&mut self) -> Result<Option<i32>> {
        if let Some(code) = self.exit_code {
            return Ok(Some(code));
        }
        let status = self.child.try_wait()?;
        if let Some(status) = status {
            let code = status.exit_code() as i32;
            self.exit_code = Some(code);
            return Ok(Some(code));
        }
        Ok(None)
    }

    /// Block until the process exits and return its exit code
    pub fn wait(&mut self) -> Result<i32> {
        if let Some(code) = self.exit_code {
            return Ok(code);
        }
        let status = self.child.wait()?;
        let code = status.exit_code() as i32;
        self.exit_code = Some(code);
        Ok(code)
    }

    /// Wait up to `grace` for a voluntary exit, then kill and reap the process
    pub fn shutdown(&mut self, grace: Duration) {
        let deadline = Instant::now() + grace;
        loop {
            match self.try_wait() {
                Ok(Some(code)) => {
                    debug!("PTY child {:?} exited with code {}", self.pid, code);
                    return;
                }
                Ok(None) if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(10));
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to poll PTY child {:?}: {}", self.pid, e);
                    break;
                }
            }
        }

        if let Err(e) = self.child.kill() {
            debug!("PTY child {:?} kill failed: {}", self.pid, e);
        }
        match self.wait() {
            Ok(code) => debug!("PTY child {:?} reaped with code {}", self.pid, code),
            Err(e) => warn!("Failed to reap PTY child {:?}: {}", self.pid, e),
        }
    }
}

/// Spawn a new process inside a PTY
pub fn spawn_pty_process(config: &SpawnConfig) -> Result<(PtyChild, PtyStreams)> {
    let pty_system = native_pty_system();

    let pair = pty_system
        .openpty(config.size)
        .map_err(|e| Error::PtyCreationFailed {
            command: config.program.clone(),
            reason: e.to_string(),
        })?;

    let mut cmd_builder = CommandBuilder::new(&config.program);
    cmd_builder.args(&config.args);

    for (key, value) in &config.env {
        cmd_builder.env(key, value);
    }

    if let Some(dir) = &config.working_directory {
        cmd_builder.cwd(dir);
    }

    let child = pair
        .slave
        .spawn_command(cmd_builder)
        .map_err(|e| Error::CommandSpawnFailed {
            command: config.program.clone(),
            reason: e.to_string(),
        })?;

    // Only the child may hold the slave side, otherwise the reader never sees EOF
    drop(pair.slave);

    let pid = child.process_id();
    let streams = create_pty_streams(pair.master.as_ref())?;

    info!("Spawned '{}' in PTY (pid {:?})", config.program, pid);

    Ok((
        PtyChild {
            child,
            _master: pair.master,
            pid,
            started_at: Utc::now(),
            exit_code: None,
        },
        streams,
    ))
}

/// Create PTY streams from the master side of a PTY
fn create_pty_streams(master: &(dyn MasterPty + Send)) -> Result<PtyStreams> {
    // Bridge blocking PTY I/O to async via channels and background threads
    let mut master_reader = master
        .try_clone_reader()
        .map_err(|e| Error::PtyReaderCloneFailed {
            reason: e.to_string(),
        })?;
    let mut master_writer = master
        .take_writer()
        .map_err(|e| Error::PtyWriterTakeFailed {
            reason: e.to_string(),
        })?;

    // Channel: PTY output -> async consumer
    let (tx_async_out, rx_async_out) = unbounded_channel::<Vec<u8>>();
    // Channel: async producer (stdin) -> PTY writer thread
    let (tx_stdin, rx_stdin) = channel::<Vec<u8>>();

    // Reader thread: read from PTY master and forward to async channel
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        let mut consecutive_errors = 0;
        const MAX_CONSECUTIVE_ERRORS: u32 = 3;

        loop {
            match master_reader.read(&mut buf) {
                Ok(0) => {
                    debug!("PTY read EOF - process terminated");
                    break;
                }
                Ok(n) => {
                    consecutive_errors = 0;

                    if tx_async_out.send(buf[..n].to_vec()).is_err() {
                        debug!("PTY read: receiver dropped, stopping reader thread");
                        break;
                    }
                }
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::Interrupted {
                        continue;
                    }

                    if e.kind() == std::io::ErrorKind::WouldBlock {
                        thread::sleep(Duration::from_millis(10));
                        continue;
                    }

                    // Linux reports EIO once the slave side is gone; treat repeated
                    // failures as end of stream
                    consecutive_errors += 1;
                    debug!(
                        "PTY read error ({}): {} (attempt {}/{})",
                        e.kind(),
                        e,
                        consecutive_errors,
                        MAX_CONSECUTIVE_ERRORS
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        break;
                    }

                    thread::sleep(Duration::from_millis(10));
                }
            }
        }
        debug!("PTY reader thread exiting");
    });

    // Writer thread: receive stdin data and write to PTY master
    thread::spawn(move || {
        while let Ok(data) = rx_stdin.recv() {
            let mut attempts = 0;
            const MAX_ATTEMPTS: u32 = 3;

            loop {
                match master_writer.write_all(&data) {
                    Ok(()) => {
                        if let Err(e) = master_writer.flush() {
                            debug!("PTY flush error: {}", e);
                        }
                        break;
                    }
                    Err(e) => {
                        attempts += 1;

                        if e.kind() == std::io::ErrorKind::Interrupted {
                            continue;
                        }

                        if e.kind() == std::io::ErrorKind::WouldBlock && attempts < MAX_ATTEMPTS {
                            thread::sleep(Duration::from_millis(10));
                            continue;
                        }

                        error!("PTY write error ({}): {}, stopping writer thread", e.kind(), e);
                        return;
                    }
                }
            }
        }
        debug!("PTY writer thread exiting");
    });

    Ok(PtyStreams::from_channels(rx_async_out, tx_stdin))
}
