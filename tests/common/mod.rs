#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use ripple::engine::{ImpactTestRunner, RunnerConfig};
use ripple::exec::ProjectTestResult;
use ripple::fs::mock::MockFileSystem;
use ripple::resolve::ImpactResolver;
use ripple_test_utils::fake_executor::{ScriptedExecutor, StaticResolver};

pub use ripple_test_utils::{init_tracing, with_timeout};

/// In-memory workspace with the given project directories under `/ws`.
pub fn mock_dirs(dirs: &[&str]) -> MockFileSystem {
    let fs = MockFileSystem::new();
    for dir in dirs {
        fs.add_dir(ws(dir));
    }
    fs
}

pub fn ws(rel: &str) -> PathBuf {
    PathBuf::from("/ws").join(rel)
}

/// Runner over a mock filesystem with a fixed list of dependents.
pub fn fake_runner(
    fs: MockFileSystem,
    dependents: &[&str],
    executor: ScriptedExecutor,
    config: RunnerConfig,
) -> (ImpactTestRunner, StaticResolver) {
    let resolver = StaticResolver::new(dependents.iter().map(|d| ws(d)).collect());
    let runner = runner_with(fs, Arc::new(resolver.clone()), executor, config);
    (runner, resolver)
}

pub fn runner_with(
    fs: MockFileSystem,
    resolver: Arc<dyn ImpactResolver>,
    executor: ScriptedExecutor,
    config: RunnerConfig,
) -> ImpactTestRunner {
    ImpactTestRunner::new("/ws", resolver, Arc::new(executor), config).with_filesystem(Arc::new(fs))
}

pub fn projects_of(results: &[ProjectTestResult]) -> Vec<PathBuf> {
    let mut projects: Vec<PathBuf> = results.iter().map(|r| r.project.clone()).collect();
    projects.sort();
    projects
}
