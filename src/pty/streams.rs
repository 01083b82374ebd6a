//! PTY Streams
//!
//! Provides async-friendly interfaces for PTY I/O by bridging blocking
//! PTY master reads/writes to async code using channels.

use crate::error::{Error, Result};
use std::sync::mpsc::Sender as StdSender;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{timeout_at, Instant};

/// Outcome of waiting for PTY output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A chunk of output arrived
    Data(Vec<u8>),
    /// Nothing arrived before the deadline
    TimedOut,
    /// The reader thread stopped; the process side of the PTY is gone
    Closed,
}

/// PTY I/O streams wrapper
pub struct PtyStreams {
    /// Receiver for output bytes from the PTY (stdout/stderr)
    output_rx: UnboundedReceiver<Vec<u8>>,
    /// Sender for input bytes to the PTY (stdin)
    input_tx: StdSender<Vec<u8>>,
    /// I/O counters
    stats: StreamStats,
}

impl PtyStreams {
    /// Create new PTY streams from channels
    pub fn from_channels(
        output_rx: UnboundedReceiver<Vec<u8>>,
        input_tx: StdSender<Vec<u8>>,
    ) -> Self {
        Self {
            output_rx,
            input_tx,
            stats: StreamStats::default(),
        }
    }

    /// Write data to the PTY stdin
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.input_tx
            .send(data.to_vec())
            .map_err(|e| Error::PtyInputSendFailed {
                reason: e.to_string(),
            })?;
        self.stats.bytes_written += data.len() as u64;
        self.stats.write_operations += 1;
        Ok(())
    }

    /// Wait for the next chunk of output until `deadline`
    pub async fn read_until(&mut self, deadline: Instant) -> ReadOutcome {
        match timeout_at(deadline, self.output_rx.recv()).await {
            Ok(Some(bytes)) => {
                self.stats.bytes_read += bytes.len() as u64;
                self.stats.read_operations += 1;
                ReadOutcome::Data(bytes)
            }
            Ok(None) => ReadOutcome::Closed,
            Err(_) => {
                self.stats.read_timeouts += 1;
                ReadOutcome::TimedOut
            }
        }
    }

    /// I/O counters since the streams were created
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }
}

impl std::fmt::Debug for PtyStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyStreams").field("stats", &self.stats).finish()
    }
}

/// Stream statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Total bytes read
    pub bytes_read: u64,
    /// Total bytes written
    pub bytes_written: u64,
    /// Number of read operations
    pub read_operations: u64,
    /// Number of write operations
    pub write_operations: u64,
    /// Number of reads that hit their deadline
    pub read_timeouts: u64,
}
