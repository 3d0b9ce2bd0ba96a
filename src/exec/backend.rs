// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The impact test runner talks to a `ProjectExecutor` instead of spawning
//! processes itself. Production uses [`super::process::ProcessExecutor`];
//! tests provide executors that, for example, sleep for a scripted duration
//! and return a canned result.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::command::CommandSpec;
use super::result::ProjectTestResult;

/// Everything one executor invocation needs to test one project.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    /// Working directory for the command.
    pub project: PathBuf,
    pub command: CommandSpec,
    /// Kill the process and report a timeout once this much time has passed.
    pub timeout: Option<Duration>,
    /// How long to wait for the output pipe to close after the process exits.
    pub output_grace: Duration,
    /// Fired when the whole run is cancelled.
    pub cancel: CancellationToken,
}

/// Trait abstracting how a single project's tests are executed.
///
/// Implementations must be infallible from the caller's point of view: every
/// problem (bad command, spawn error, timeout, ...) is folded into the
/// returned [`ProjectTestResult`].
pub trait ProjectExecutor: Send + Sync {
    fn execute(
        &self,
        request: ExecRequest,
    ) -> Pin<Box<dyn Future<Output = ProjectTestResult> + Send + '_>>;
}
