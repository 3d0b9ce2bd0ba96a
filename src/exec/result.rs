// src/exec/result.rs

//! Per-project outcome delivered on the result stream.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Exit code recorded when the command line is empty.
pub const INVALID_COMMAND_EXIT_CODE: i32 = 1;

/// The process ran, but no numeric exit status exists (e.g. killed by a signal).
pub const UNKNOWN_EXIT_STATUS: i32 = -1;

/// The process could not be started at all.
pub const SPAWN_FAILED_EXIT_CODE: i32 = -2;

/// The per-project timeout elapsed and the process was killed.
pub const TIMED_OUT_EXIT_CODE: i32 = -3;

/// The run was cancelled and the process was killed.
pub const CANCELLED_EXIT_CODE: i32 = -4;

/// Why a project's test invocation did not produce a genuine exit code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("invalid command: no program given")]
    InvalidCommand,

    #[error("project directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to start process: {0}")]
    SpawnFailed(String),

    #[error("failed to wait for process: {0}")]
    WaitFailed(String),

    #[error("process terminated abnormally{}", signal_suffix(.signal))]
    AbnormalTermination { signal: Option<i32> },

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("cancelled before completion")]
    Cancelled,

    #[error("executor panicked: {0}")]
    Panicked(String),
}

fn signal_suffix(signal: &Option<i32>) -> String {
    match signal {
        Some(sig) => format!(" (signal {sig})"),
        None => String::new(),
    }
}

impl FailureReason {
    /// Exit code recorded alongside this reason.
    pub fn exit_code(&self) -> i32 {
        match self {
            FailureReason::InvalidCommand => INVALID_COMMAND_EXIT_CODE,
            FailureReason::MissingDirectory(_) | FailureReason::SpawnFailed(_) => {
                SPAWN_FAILED_EXIT_CODE
            }
            FailureReason::WaitFailed(_)
            | FailureReason::AbnormalTermination { .. }
            | FailureReason::Panicked(_) => UNKNOWN_EXIT_STATUS,
            FailureReason::TimedOut(_) => TIMED_OUT_EXIT_CODE,
            FailureReason::Cancelled => CANCELLED_EXIT_CODE,
        }
    }
}

/// Outcome of testing one project.
///
/// Exactly one of these is produced per project per run, by the executor that
/// handled it. `failure` is `None` whenever the process ran to completion and
/// reported a real exit code, including non-zero ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTestResult {
    pub project: PathBuf,
    pub exit_code: i32,
    /// Combined stdout/stderr bytes, in the order the process wrote them.
    pub output: Vec<u8>,
    pub failure: Option<FailureReason>,
    pub elapsed: Duration,
}

impl ProjectTestResult {
    /// The process ran and exited with `exit_code`.
    pub fn completed(
        project: impl Into<PathBuf>,
        exit_code: i32,
        output: Vec<u8>,
        elapsed: Duration,
    ) -> Self {
        Self {
            project: project.into(),
            exit_code,
            output,
            failure: None,
            elapsed,
        }
    }

    /// The invocation failed for `reason`; the exit code is the reason's sentinel.
    pub fn failed(
        project: impl Into<PathBuf>,
        reason: FailureReason,
        output: Vec<u8>,
        elapsed: Duration,
    ) -> Self {
        Self {
            project: project.into(),
            exit_code: reason.exit_code(),
            output,
            failure: Some(reason),
            elapsed,
        }
    }

    pub fn project(&self) -> &Path {
        &self.project
    }

    /// True only for a process that ran and exited with code 0.
    pub fn passed(&self) -> bool {
        self.exit_code == 0 && self.failure.is_none()
    }

    pub fn output_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}
