// src/engine/runner.rs

//! Fan-out / fan-in impact test runner.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, RippleError};
use crate::exec::{
    CommandSpec, ExecRequest, FailureReason, ProjectExecutor, ProjectTestResult,
    DEFAULT_OUTPUT_GRACE,
};
use crate::fs::{FileSystem, RealFileSystem};
use crate::resolve::ImpactResolver;
use crate::types::Parallelism;

use super::impact_set::ImpactSet;

/// Runner settings, passed explicitly into every [`ImpactTestRunner`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Program and arguments run in every affected project.
    pub command: Vec<String>,
    /// Bound on concurrently running executors.
    pub parallelism: Parallelism,
    /// Capacity of the result stream; `None` = available parallelism.
    pub result_buffer: Option<usize>,
    /// Per-project timeout.
    pub timeout: Option<Duration>,
    /// How long an executor keeps draining output after its process exits.
    pub output_grace: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: vec!["npm".to_string(), "test".to_string()],
            parallelism: Parallelism::Unbounded,
            result_buffer: None,
            timeout: None,
            output_grace: DEFAULT_OUTPUT_GRACE,
        }
    }
}

impl RunnerConfig {
    fn stream_capacity(&self) -> usize {
        self.result_buffer
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

/// Tests every project affected by a change, concurrently.
///
/// One call to [`ImpactTestRunner::start`] resolves the impact set
/// synchronously, then launches one executor invocation per project and hands
/// back a [`RunHandle`] that yields results in completion order.
pub struct ImpactTestRunner {
    workspace_root: PathBuf,
    resolver: Arc<dyn ImpactResolver>,
    executor: Arc<dyn ProjectExecutor>,
    fs: Arc<dyn FileSystem>,
    config: RunnerConfig,
    parent_cancel: Option<CancellationToken>,
}

impl fmt::Debug for ImpactTestRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImpactTestRunner")
            .field("workspace_root", &self.workspace_root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ImpactTestRunner {
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        resolver: Arc<dyn ImpactResolver>,
        executor: Arc<dyn ProjectExecutor>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            resolver,
            executor,
            fs: Arc::new(RealFileSystem),
            config,
            parent_cancel: None,
        }
    }

    /// Use a different filesystem for impact-set validation.
    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Derive every run's cancellation token from `token`, so cancelling it
    /// stops all runs started by this runner.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.parent_cancel = Some(token);
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Validate the changed project, ask the resolver for its dependents and
    /// build the impact set. Nothing is executed.
    pub fn impact_set(&self, changed_project: &Path) -> Result<ImpactSet> {
        if !self.fs.is_dir(changed_project) {
            return Err(RippleError::ProjectNotFound(changed_project.to_path_buf()));
        }

        let dependents = self
            .resolver
            .resolve(&self.workspace_root, changed_project)?;
        debug!(
            project = %changed_project.display(),
            ?dependents,
            "impact resolver returned dependents"
        );

        ImpactSet::build(self.fs.as_ref(), dependents, changed_project)
    }

    /// Start testing every project affected by `changed_project`.
    ///
    /// Resolution errors are returned here, before any process is launched.
    /// Afterwards every project yields exactly one result on the returned
    /// handle, and the handle's stream closes once the last one is delivered.
    ///
    /// Must be called from within a multi-threaded Tokio runtime so project
    /// waits run in parallel; outside any runtime this returns
    /// [`RippleError::NoRuntime`].
    pub fn start(&self, changed_project: &Path) -> Result<RunHandle> {
        let runtime = Handle::try_current().map_err(|_| RippleError::NoRuntime)?;
        let impact = self.impact_set(changed_project)?;

        let (tx, rx) = mpsc::channel(self.config.stream_capacity());
        let outstanding = Arc::new(AtomicUsize::new(impact.len()));
        let cancel = match &self.parent_cancel {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let slots = match self.config.parallelism {
            Parallelism::Limited(n) => Some(Arc::new(Semaphore::new(n.max(1)))),
            Parallelism::Unbounded => None,
        };
        let command = CommandSpec::from(self.config.command.clone());
        if command.is_empty() {
            warn!("no test command configured; every project will report an invalid command");
        }

        info!(
            changed = %impact.changed_project().display(),
            projects = impact.len(),
            cmd = %command,
            parallelism = ?self.config.parallelism,
            "starting impact test run"
        );

        for project in impact.iter() {
            let worker = Worker {
                executor: Arc::clone(&self.executor),
                request: ExecRequest {
                    project: project.clone(),
                    command: command.clone(),
                    timeout: self.config.timeout,
                    output_grace: self.config.output_grace,
                    cancel: cancel.clone(),
                },
                slots: slots.clone(),
                results: tx.clone(),
                outstanding: Arc::clone(&outstanding),
            };
            runtime.spawn(worker.run());
        }
        // From here on only workers hold senders; the stream closes with the last one.
        drop(tx);

        Ok(RunHandle {
            results: rx,
            outstanding,
            cancel,
            impact,
        })
    }
}

/// One project's share of a run.
struct Worker {
    executor: Arc<dyn ProjectExecutor>,
    request: ExecRequest,
    slots: Option<Arc<Semaphore>>,
    results: mpsc::Sender<ProjectTestResult>,
    outstanding: Arc<AtomicUsize>,
}

impl Worker {
    async fn run(self) {
        let started = Instant::now();
        let project = self.request.project.clone();
        let cancel = self.request.cancel.clone();

        let _permit = match self.slots.clone() {
            Some(slots) => tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(project = %project.display(), "run cancelled while waiting for a slot");
                    let result = ProjectTestResult::failed(
                        project,
                        FailureReason::Cancelled,
                        Vec::new(),
                        started.elapsed(),
                    );
                    self.deliver(result).await;
                    return;
                }
                permit = slots.acquire_owned() => permit.ok(),
            },
            None => None,
        };

        // Run the executor in its own task so a panic still yields a result.
        let executor = Arc::clone(&self.executor);
        let request = self.request.clone();
        let execution = tokio::spawn(async move { executor.execute(request).await });

        let result = match execution.await {
            Ok(result) => result,
            Err(e) => {
                error!(project = %project.display(), error = %e, "project executor failed");
                ProjectTestResult::failed(
                    project,
                    FailureReason::Panicked(e.to_string()),
                    Vec::new(),
                    started.elapsed(),
                )
            }
        };

        self.deliver(result).await;
    }

    async fn deliver(self, result: ProjectTestResult) {
        // Decrement first: a result the caller holds is never outstanding.
        self.outstanding.fetch_sub(1, Ordering::AcqRel);

        let project = result.project.clone();
        if self.results.send(result).await.is_err() {
            debug!(
                project = %project.display(),
                "result stream dropped by caller; discarding result"
            );
        }
    }
}

/// Handle to one in-progress run.
///
/// Drain it with `while let Some(result) = handle.next().await`; the loop ends
/// once every launched project has reported. Results arrive in completion
/// order, not launch order.
#[derive(Debug)]
pub struct RunHandle {
    results: mpsc::Receiver<ProjectTestResult>,
    outstanding: Arc<AtomicUsize>,
    cancel: CancellationToken,
    impact: ImpactSet,
}

impl RunHandle {
    /// Next completed result, or `None` once all projects have reported.
    pub async fn next(&mut self) -> Option<ProjectTestResult> {
        self.results.recv().await
    }

    /// Projects whose invocation has not completed yet.
    ///
    /// Reaching zero does not mean the stream is drained: completed results
    /// may still be buffered. Keep calling [`RunHandle::next`] until `None`.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub fn impact_set(&self) -> &ImpactSet {
        &self.impact
    }

    /// Kill in-flight processes. Every project still reports one result,
    /// marked as cancelled if it had not finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run; useful for wiring external signals.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drain the stream into a vector, in completion order.
    pub async fn collect(mut self) -> Vec<ProjectTestResult> {
        let mut out = Vec::with_capacity(self.impact.len());
        while let Some(result) = self.next().await {
            out.push(result);
        }
        out
    }
}
