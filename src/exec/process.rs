// src/exec/process.rs

//! Real process executor.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use tokio::process::Child;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::{ExecRequest, ProjectExecutor};
use super::capture::PendingCapture;
use super::result::{FailureReason, ProjectTestResult};

/// Executor that spawns the command as an OS process in the project directory.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ProjectExecutor for ProcessExecutor {
    fn execute(
        &self,
        request: ExecRequest,
    ) -> Pin<Box<dyn Future<Output = ProjectTestResult> + Send + '_>> {
        Box::pin(run_project(request))
    }
}

/// How the wait on the child ended.
enum Exit {
    Status(ExitStatus),
    WaitFailed(std::io::Error),
    TimedOut(Duration),
    Cancelled,
}

/// Run one project's command and fold every outcome into a result.
///
/// The sequence is: validate, attach the combined pipe, spawn, then wait for
/// exit while the pipe drains, and finally join the drain. Output and exit
/// status therefore always come from the same process handle.
pub async fn run_project(request: ExecRequest) -> ProjectTestResult {
    let started = Instant::now();
    let ExecRequest {
        project,
        command,
        timeout,
        output_grace,
        cancel,
    } = request;

    let Some(mut cmd) = command.to_command(&project) else {
        warn!(project = %project.display(), "empty command; nothing to run");
        return ProjectTestResult::failed(
            project,
            FailureReason::InvalidCommand,
            Vec::new(),
            started.elapsed(),
        );
    };

    if !project.is_dir() {
        warn!(project = %project.display(), "project directory missing at spawn time");
        let reason = FailureReason::MissingDirectory(project.clone());
        return ProjectTestResult::failed(project, reason, Vec::new(), started.elapsed());
    }

    let pending = match PendingCapture::attach(&mut cmd) {
        Ok(p) => p,
        Err(e) => {
            return spawn_failure(project, format!("creating output pipe: {e}"), started);
        }
    };

    info!(project = %project.display(), cmd = %command, "starting project tests");

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return spawn_failure(project, format!("{}: {e}", command), started);
        }
    };
    // Release the command's copies of the pipe's write ends.
    drop(cmd);

    let capture = pending.start();
    let exit = wait_for_exit(&mut child, &project, timeout, &cancel).await;
    let output = capture.finish(output_grace).await;
    let elapsed = started.elapsed();

    let result = match exit {
        Exit::Status(status) => match status.code() {
            Some(code) => ProjectTestResult::completed(project, code, output, elapsed),
            None => ProjectTestResult::failed(
                project,
                FailureReason::AbnormalTermination {
                    signal: termination_signal(&status),
                },
                output,
                elapsed,
            ),
        },
        Exit::WaitFailed(e) => ProjectTestResult::failed(
            project,
            FailureReason::WaitFailed(e.to_string()),
            output,
            elapsed,
        ),
        Exit::TimedOut(after) => {
            ProjectTestResult::failed(project, FailureReason::TimedOut(after), output, elapsed)
        }
        Exit::Cancelled => {
            ProjectTestResult::failed(project, FailureReason::Cancelled, output, elapsed)
        }
    };

    info!(
        project = %result.project.display(),
        exit_code = result.exit_code,
        success = result.passed(),
        elapsed_ms = elapsed.as_millis() as u64,
        "project tests finished"
    );

    result
}

/// Wait for the child, unless the timeout elapses or the run is cancelled
/// first; in those cases the child is killed before returning.
async fn wait_for_exit(
    child: &mut Child,
    project: &Path,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Exit {
    let deadline = async {
        match timeout {
            Some(after) => tokio::time::sleep(after).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        status_res = child.wait() => match status_res {
            Ok(status) => Exit::Status(status),
            Err(e) => Exit::WaitFailed(e),
        },

        _ = deadline => {
            let after = timeout.unwrap_or_default();
            info!(project = %project.display(), ?after, "project tests timed out; killing process");
            kill_child(child, project).await;
            Exit::TimedOut(after)
        }

        _ = cancel.cancelled() => {
            info!(project = %project.display(), "run cancelled; killing process");
            kill_child(child, project).await;
            Exit::Cancelled
        }
    }
}

/// Kill the child's whole process group (unix), then the child itself.
///
/// Descendants share the combined output pipe, so the drain only reaches EOF
/// once they are gone too.
async fn kill_child(child: &mut Child, project: &Path) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        kill_process_group(pid, project);
    }

    if let Err(e) = child.kill().await {
        // Usually means the process exited on its own in the meantime.
        debug!(
            project = %project.display(),
            error = %e,
            "failed to kill child process"
        );
    }
}

fn spawn_failure(project: PathBuf, message: String, started: Instant) -> ProjectTestResult {
    warn!(project = %project.display(), error = %message, "could not start project tests");
    ProjectTestResult::failed(
        project,
        FailureReason::SpawnFailed(message),
        Vec::new(),
        started.elapsed(),
    )
}

#[cfg(unix)]
fn kill_process_group(pgid: u32, project: &Path) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        // ESRCH: the group is already empty.
        debug!(
            project = %project.display(),
            pgid,
            error = %e,
            "failed to kill process group"
        );
    }
}

#[cfg(unix)]
fn termination_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn termination_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
