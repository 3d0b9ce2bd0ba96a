// src/exec/capture.rs

//! Combined stdout/stderr capture.
//!
//! Both streams of the child are pointed at the write end of a single OS
//! pipe, so the bytes arrive in exactly the order the process wrote them. A
//! blocking task drains the read end into a shared buffer while the executor
//! waits for the process to exit.

use std::io::{self, PipeReader, Read};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default for how long to keep draining after the process is gone.
///
/// A descendant that left the process group but inherited the pipe can keep
/// it open indefinitely; after the grace period whatever has been read so far
/// is returned.
pub const DEFAULT_OUTPUT_GRACE: Duration = Duration::from_secs(2);

/// Read end of the combined pipe, before the child has been spawned.
#[derive(Debug)]
pub(crate) struct PendingCapture {
    reader: PipeReader,
}

impl PendingCapture {
    /// Route the command's stdout and stderr into one pipe. Stdin is closed.
    ///
    /// The command keeps the write ends until it is dropped, so callers must
    /// drop it right after spawning or the drain never sees EOF.
    pub(crate) fn attach(cmd: &mut Command) -> io::Result<Self> {
        let (reader, writer) = io::pipe()?;
        let writer_err = writer.try_clone()?;
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(writer))
            .stderr(Stdio::from(writer_err));
        Ok(Self { reader })
    }

    /// Start draining the pipe in the background.
    pub(crate) fn start(self) -> CombinedOutput {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let reader = self.reader;
        let drain = tokio::task::spawn_blocking(move || drain_into(reader, &sink));
        CombinedOutput { buffer, drain }
    }
}

/// A running drain of the combined pipe.
#[derive(Debug)]
pub(crate) struct CombinedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
    drain: JoinHandle<()>,
}

impl CombinedOutput {
    /// Wait (at most `grace`) for EOF and return everything captured.
    pub(crate) async fn finish(self, grace: Duration) -> Vec<u8> {
        match tokio::time::timeout(grace, self.drain).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "output drain task failed"),
            Err(_) => debug!(
                ?grace,
                "output pipe still open after process exit; returning partial output"
            ),
        }
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *buffer)
    }
}

fn drain_into(mut reader: PipeReader, sink: &Mutex<Vec<u8>>) {
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => sink
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "reading combined output failed");
                break;
            }
        }
    }
}
