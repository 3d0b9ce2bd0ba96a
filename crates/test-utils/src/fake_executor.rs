use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ripple::errors::{Result, RippleError};
use ripple::exec::{ExecRequest, FailureReason, ProjectExecutor, ProjectTestResult};
use ripple::resolve::ImpactResolver;

/// What a scripted project does when "tested".
#[derive(Debug, Clone)]
pub struct Script {
    pub delay: Duration,
    pub exit_code: i32,
    pub output: Vec<u8>,
    pub panic: bool,
}

impl Script {
    pub fn pass() -> Self {
        Self {
            delay: Duration::ZERO,
            exit_code: 0,
            output: Vec::new(),
            panic: false,
        }
    }

    pub fn exit(code: i32) -> Self {
        Self {
            exit_code: code,
            ..Self::pass()
        }
    }

    pub fn panics() -> Self {
        Self {
            panic: true,
            ..Self::pass()
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn output(mut self, bytes: &[u8]) -> Self {
        self.output = bytes.to_vec();
        self
    }
}

/// A fake executor that:
/// - records which projects were started
/// - sleeps for the scripted delay, honouring cancellation and timeouts
/// - reports the scripted exit code and output
/// - tracks how many invocations were in flight at once
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
    scripts: Arc<Mutex<HashMap<PathBuf, Script>>>,
    started: Arc<Mutex<Vec<PathBuf>>>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `project`; unscripted projects pass immediately.
    pub fn script(self, project: impl Into<PathBuf>, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(project.into(), script);
        self
    }

    pub fn started(&self) -> Vec<PathBuf> {
        self.started.lock().unwrap().clone()
    }

    /// Highest number of invocations observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn script_for(&self, project: &Path) -> Script {
        self.scripts
            .lock()
            .unwrap()
            .get(project)
            .cloned()
            .unwrap_or_else(Script::pass)
    }
}

impl ProjectExecutor for ScriptedExecutor {
    fn execute(
        &self,
        request: ExecRequest,
    ) -> Pin<Box<dyn Future<Output = ProjectTestResult> + Send + '_>> {
        Box::pin(async move {
            let started = Instant::now();
            let script = self.script_for(&request.project);
            self.started.lock().unwrap().push(request.project.clone());

            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let _guard = RunningGuard(Arc::clone(&self.running));

            if script.panic {
                panic!("scripted panic in {}", request.project.display());
            }

            let limit = request.timeout.unwrap_or(Duration::MAX);
            tokio::select! {
                _ = tokio::time::sleep(script.delay.min(limit)) => {}
                _ = request.cancel.cancelled() => {
                    return ProjectTestResult::failed(
                        request.project,
                        FailureReason::Cancelled,
                        Vec::new(),
                        started.elapsed(),
                    );
                }
            }

            if script.delay > limit {
                return ProjectTestResult::failed(
                    request.project,
                    FailureReason::TimedOut(limit),
                    Vec::new(),
                    started.elapsed(),
                );
            }

            ProjectTestResult::completed(
                request.project,
                script.exit_code,
                script.output,
                started.elapsed(),
            )
        })
    }
}

struct RunningGuard(Arc<AtomicUsize>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resolver that returns a fixed list of dependents and counts its calls.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    dependents: Vec<PathBuf>,
    calls: Arc<AtomicUsize>,
}

impl StaticResolver {
    pub fn new(dependents: Vec<PathBuf>) -> Self {
        Self {
            dependents,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImpactResolver for StaticResolver {
    fn resolve(&self, _workspace_root: &Path, _changed_project: &Path) -> Result<Vec<PathBuf>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.dependents.clone())
    }
}

/// Resolver that always fails.
#[derive(Debug, Clone)]
pub struct FailingResolver {
    pub message: String,
}

impl FailingResolver {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl ImpactResolver for FailingResolver {
    fn resolve(&self, _workspace_root: &Path, _changed_project: &Path) -> Result<Vec<PathBuf>> {
        Err(RippleError::Resolution(self.message.clone()))
    }
}
