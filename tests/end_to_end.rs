// tests/end_to_end.rs
//
// Manifest resolution plus real processes, wired the way the CLI wires them.
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::path::PathBuf;
use std::sync::Arc;

use ripple::engine::{ImpactTestRunner, RunSummary};
use ripple::exec::ProcessExecutor;
use ripple::fs::RealFileSystem;
use ripple::resolve::{DiscoveryOptions, ManifestResolver};
use ripple_test_utils::builders::{RunnerConfigBuilder, Workspace, WorkspaceBuilder};

fn monorepo() -> Workspace {
    WorkspaceBuilder::new()
        .project("packages/core", "@acme/core", &[])
        .project("packages/api", "@acme/api", &["@acme/core"])
        .project("apps/web", "web", &["@acme/api"])
        .project("apps/admin", "admin", &["@acme/core"])
        .project("tools/lint", "lint", &[])
        .build()
}

fn runner(ws: &Workspace, command: &[&str]) -> ImpactTestRunner {
    ImpactTestRunner::new(
        ws.root(),
        Arc::new(ManifestResolver::new(
            Arc::new(RealFileSystem),
            DiscoveryOptions::default(),
        )),
        Arc::new(ProcessExecutor::new()),
        RunnerConfigBuilder::new().command(command).build(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn changed_library_tests_every_dependent_and_itself() {
    init_tracing();
    let ws = monorepo();
    let runner = runner(&ws, &["sh", "-c", "basename \"$(pwd -P)\""]);

    let results = with_timeout(runner.start(&ws.path("packages/core")).unwrap().collect()).await;

    let mut projects: Vec<PathBuf> = results.iter().map(|r| r.project.clone()).collect();
    projects.sort();
    assert_eq!(
        projects,
        vec![
            ws.path("apps/admin"),
            ws.path("apps/web"),
            ws.path("packages/api"),
            ws.path("packages/core"),
        ]
    );

    for result in &results {
        assert!(result.passed());
        let dir_name = result.project.file_name().unwrap().to_str().unwrap();
        assert_eq!(result.output_lossy().trim(), dir_name);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exit_codes_are_reported_per_project() {
    let ws = monorepo();
    // Fail only in the `web` app.
    let runner = runner(
        &ws,
        &["sh", "-c", "if [ \"$(basename \"$(pwd -P)\")\" = web ]; then echo broken; exit 4; fi"],
    );

    let results = with_timeout(runner.start(&ws.path("packages/api")).unwrap().collect()).await;
    assert_eq!(results.len(), 2);

    let summary = RunSummary::from_results(&results);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, vec![ws.path("apps/web")]);
    assert_eq!(summary.exit_code(), 1);

    let web = results.iter().find(|r| r.project == ws.path("apps/web")).unwrap();
    assert_eq!(web.exit_code, 4);
    assert_eq!(web.output_lossy(), "broken\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn staggered_projects_arrive_in_completion_order() {
    let ws = WorkspaceBuilder::new()
        .project("core", "core", &[])
        .project("slow", "slow", &["core"])
        .project("fast", "fast", &["core"])
        .file("core/delay", "0.9")
        .file("slow/delay", "0.6")
        .file("fast/delay", "0.1")
        .build();
    let runner = runner(&ws, &["sh", "-c", "sleep \"$(cat delay)\""]);

    let results = with_timeout(runner.start(&ws.path("core")).unwrap().collect()).await;
    let order: Vec<PathBuf> = results.iter().map(|r| r.project.clone()).collect();
    assert_eq!(order, vec![ws.path("fast"), ws.path("slow"), ws.path("core")]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_program_fails_each_project_without_failing_the_run() {
    let ws = monorepo();
    let runner = runner(&ws, &["ripple-no-such-test-runner"]);

    let results = with_timeout(runner.start(&ws.path("apps/web")).unwrap().collect()).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].exit_code, ripple::exec::SPAWN_FAILED_EXIT_CODE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn running_twice_gives_the_same_projects() {
    let ws = monorepo();
    let runner = runner(&ws, &["true"]);

    let mut first: Vec<PathBuf> = with_timeout(runner.start(&ws.path("packages/api")).unwrap().collect())
        .await
        .into_iter()
        .map(|r| r.project)
        .collect();
    let mut second: Vec<PathBuf> = with_timeout(runner.start(&ws.path("packages/api")).unwrap().collect())
        .await
        .into_iter()
        .map(|r| r.project)
        .collect();
    first.sort();
    second.sort();
    assert_eq!(first, second);
}

#[tokio::test]
async fn impact_set_without_running() {
    let ws = monorepo();
    let runner = runner(&ws, &["false"]);

    let impact = runner.impact_set(&ws.path("packages/api")).unwrap();
    assert_eq!(impact.dependents(), &[ws.path("apps/web")]);
    assert_eq!(impact.changed_project(), ws.path("packages/api"));
}

fn cli_args(ws: &Workspace, extra: &[&str]) -> ripple::cli::CliArgs {
    use clap::Parser;

    let config = ws.path("Ripple.toml");
    std::fs::write(&config, "[runner]\ncommand = [\"false\"]\n").unwrap();

    let root = ws.root().to_str().unwrap().to_string();
    let config = config.to_str().unwrap().to_string();
    let mut argv = vec!["ripple", "--root", root.as_str(), "--config", config.as_str()];
    argv.extend_from_slice(extra);
    ripple::cli::CliArgs::try_parse_from(argv).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cli_entry_point_runs_and_summarises() {
    let ws = monorepo();
    // The trailing command overrides the configured `false`.
    let args = cli_args(&ws, &["@acme/api", "--", "true"]);

    let summary = with_timeout(ripple::run(args)).await.unwrap();
    assert_eq!(summary.total, 2);
    assert!(summary.all_passed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cli_entry_point_uses_configured_command() {
    let ws = monorepo();
    let args = cli_args(&ws, &["apps/web"]);

    let summary = with_timeout(ripple::run(args)).await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn cli_dry_run_executes_nothing() {
    let ws = monorepo();
    let args = cli_args(&ws, &["--dry-run", "packages/core"]);

    let summary = with_timeout(ripple::run(args)).await.unwrap();
    assert_eq!(summary, RunSummary::new());
}

#[tokio::test]
async fn cli_unknown_project_is_an_error() {
    let ws = monorepo();
    let args = cli_args(&ws, &["no-such-package"]);

    let err = with_timeout(ripple::run(args)).await.unwrap_err();
    assert!(matches!(err, ripple::errors::RippleError::ProjectNotFound(_)));
}
