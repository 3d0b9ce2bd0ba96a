// tests/runner_stream.rs

mod common;
use crate::common::{fake_runner, init_tracing, mock_dirs, projects_of, runner_with, with_timeout, ws};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use ripple::engine::{ImpactTestRunner, RunnerConfig};
use ripple::errors::RippleError;
use ripple::exec::{FailureReason, CANCELLED_EXIT_CODE, TIMED_OUT_EXIT_CODE, UNKNOWN_EXIT_STATUS};
use ripple_test_utils::builders::RunnerConfigBuilder;
use ripple_test_utils::fake_executor::{FailingResolver, Script, ScriptedExecutor, StaticResolver};
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_project_reports_exactly_once() {
    init_tracing();
    let fs = mock_dirs(&["a", "b", "c", "d"]);
    let (runner, _) = fake_runner(
        fs,
        &["a", "b", "c"],
        ScriptedExecutor::new(),
        RunnerConfig::default(),
    );

    let handle = runner.start(&ws("d")).expect("start run");
    assert_eq!(handle.impact_set().len(), 4);

    let results = with_timeout(handle.collect()).await;
    assert_eq!(results.len(), 4);
    assert_eq!(projects_of(&results), vec![ws("a"), ws("b"), ws("c"), ws("d")]);
    assert!(results.iter().all(|r| r.passed()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn results_arrive_in_completion_order() {
    init_tracing();
    let executor = ScriptedExecutor::new()
        .script(ws("a"), Script::pass().after(Duration::from_millis(450)))
        .script(ws("b"), Script::pass().after(Duration::from_millis(150)))
        .script(ws("c"), Script::pass().after(Duration::from_millis(300)))
        .script(ws("d"), Script::pass().after(Duration::from_millis(600)));
    let (runner, _) = fake_runner(
        mock_dirs(&["a", "b", "c", "d"]),
        &["a", "b", "c"],
        executor,
        RunnerConfig::default(),
    );

    let results = with_timeout(runner.start(&ws("d")).unwrap().collect()).await;
    let order: Vec<_> = results.iter().map(|r| r.project.clone()).collect();
    assert_eq!(order, vec![ws("b"), ws("c"), ws("a"), ws("d")]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stream_stays_open_until_last_project_reports() {
    init_tracing();
    let executor = ScriptedExecutor::new()
        .script(ws("slow"), Script::pass().after(Duration::from_millis(300)));
    let (runner, _) = fake_runner(
        mock_dirs(&["fast", "slow"]),
        &["slow"],
        executor,
        RunnerConfig::default(),
    );

    let mut handle = runner.start(&ws("fast")).unwrap();
    let first = with_timeout(handle.next()).await.expect("first result");
    assert_eq!(first.project, ws("fast"));
    assert_eq!(handle.outstanding(), 1);

    let second = with_timeout(handle.next()).await.expect("second result");
    assert_eq!(second.project, ws("slow"));
    assert!(with_timeout(handle.next()).await.is_none());
    assert_eq!(handle.outstanding(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn received_results_are_never_counted_as_outstanding() {
    init_tracing();
    let executor = ScriptedExecutor::new()
        .script(ws("a"), Script::pass().after(Duration::from_millis(40)))
        .script(ws("b"), Script::exit(3).after(Duration::from_millis(80)))
        .script(ws("c"), Script::pass().after(Duration::from_millis(120)));
    let (runner, _) = fake_runner(
        mock_dirs(&["a", "b", "c", "d"]),
        &["a", "b", "c"],
        executor,
        RunnerConfigBuilder::new().result_buffer(1).build(),
    );

    let mut handle = runner.start(&ws("d")).unwrap();
    let mut remaining = handle.impact_set().len();
    while let Some(result) = with_timeout(handle.next()).await {
        remaining -= 1;
        let outstanding = handle.outstanding();
        assert!(
            outstanding <= remaining,
            "{} delivered but {outstanding} still outstanding with {remaining} left",
            result.project.display()
        );
    }
    assert_eq!(remaining, 0);
    assert_eq!(handle.outstanding(), 0);
}

#[tokio::test]
async fn resolver_failure_is_returned_before_anything_runs() {
    init_tracing();
    let executor = ScriptedExecutor::new();
    let runner = runner_with(
        mock_dirs(&["api"]),
        Arc::new(FailingResolver::new("manifest unreadable")),
        executor.clone(),
        RunnerConfig::default(),
    );

    let err = runner.start(&ws("api")).unwrap_err();
    assert!(matches!(err, RippleError::Resolution(ref msg) if msg == "manifest unreadable"));
    assert!(executor.started().is_empty());
}

#[tokio::test]
async fn missing_changed_project_is_an_error() {
    let (runner, resolver) = fake_runner(
        mock_dirs(&["a"]),
        &["a"],
        ScriptedExecutor::new(),
        RunnerConfig::default(),
    );

    let err = runner.start(&ws("gone")).unwrap_err();
    assert!(matches!(err, RippleError::ProjectNotFound(ref p) if *p == ws("gone")));
    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn missing_dependent_directory_is_an_error() {
    let executor = ScriptedExecutor::new();
    let (runner, _) = fake_runner(
        mock_dirs(&["core"]),
        &["vanished"],
        executor.clone(),
        RunnerConfig::default(),
    );

    let err = runner.start(&ws("core")).unwrap_err();
    assert!(matches!(err, RippleError::ProjectNotFound(ref p) if *p == ws("vanished")));
    assert!(executor.started().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn duplicate_dependents_are_tested_once() {
    let executor = ScriptedExecutor::new();
    let (runner, _) = fake_runner(
        mock_dirs(&["a", "core"]),
        &["a", "./a", "core", "a/../a"],
        executor.clone(),
        RunnerConfig::default(),
    );

    let handle = runner.start(&ws("core")).unwrap();
    assert_eq!(handle.impact_set().projects(), &[ws("a"), ws("core")]);

    let results = with_timeout(handle.collect()).await;
    assert_eq!(results.len(), 2);
    assert_eq!(executor.started().len(), 2);
}

#[tokio::test]
async fn no_dependents_tests_only_the_changed_project() {
    let (runner, _) = fake_runner(
        mock_dirs(&["leaf"]),
        &[],
        ScriptedExecutor::new(),
        RunnerConfig::default(),
    );

    let results = with_timeout(runner.start(&ws("leaf")).unwrap().collect()).await;
    assert_eq!(projects_of(&results), vec![ws("leaf")]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_project_does_not_stop_the_others() {
    let executor = ScriptedExecutor::new()
        .script(ws("a"), Script::exit(3).output(b"1 test failed\n"));
    let (runner, _) = fake_runner(
        mock_dirs(&["a", "b", "core"]),
        &["a", "b"],
        executor,
        RunnerConfig::default(),
    );

    let results = with_timeout(runner.start(&ws("core")).unwrap().collect()).await;
    assert_eq!(results.len(), 3);

    let a = results.iter().find(|r| r.project == ws("a")).unwrap();
    assert_eq!(a.exit_code, 3);
    assert!(a.failure.is_none());
    assert!(!a.passed());
    assert_eq!(a.output_lossy(), "1 test failed\n");

    assert!(results.iter().filter(|r| r.project != ws("a")).all(|r| r.passed()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_executor_still_reports_a_result() {
    init_tracing();
    let executor = ScriptedExecutor::new().script(ws("boom"), Script::panics());
    let (runner, _) = fake_runner(
        mock_dirs(&["boom", "core"]),
        &["boom"],
        executor,
        RunnerConfig::default(),
    );

    let results = with_timeout(runner.start(&ws("core")).unwrap().collect()).await;
    assert_eq!(results.len(), 2);

    let boom = results.iter().find(|r| r.project == ws("boom")).unwrap();
    assert_eq!(boom.exit_code, UNKNOWN_EXIT_STATUS);
    assert!(matches!(boom.failure, Some(FailureReason::Panicked(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bounded_parallelism_caps_running_executors() {
    init_tracing();
    let names = ["p1", "p2", "p3", "p4", "p5", "core"];
    let mut executor = ScriptedExecutor::new();
    for name in names {
        executor = executor.script(ws(name), Script::pass().after(Duration::from_millis(50)));
    }
    let (runner, _) = fake_runner(
        mock_dirs(&names),
        &names[..5],
        executor.clone(),
        RunnerConfigBuilder::new().max_parallel(2).build(),
    );

    let results = with_timeout(runner.start(&ws("core")).unwrap().collect()).await;
    assert_eq!(results.len(), 6);
    assert!(executor.peak_concurrency() <= 2);
    assert!(executor.peak_concurrency() >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unbounded_parallelism_starts_everything_at_once() {
    let names = ["p1", "p2", "p3", "core"];
    let mut executor = ScriptedExecutor::new();
    for name in names {
        executor = executor.script(ws(name), Script::pass().after(Duration::from_millis(300)));
    }
    let (runner, _) = fake_runner(
        mock_dirs(&names),
        &names[..3],
        executor.clone(),
        RunnerConfig::default(),
    );

    let results = with_timeout(runner.start(&ws("core")).unwrap().collect()).await;
    assert_eq!(results.len(), 4);
    assert_eq!(executor.peak_concurrency(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn single_slot_result_buffer_delivers_everything() {
    let names = ["p1", "p2", "p3", "p4", "core"];
    let (runner, _) = fake_runner(
        mock_dirs(&names),
        &names[..4],
        ScriptedExecutor::new(),
        RunnerConfigBuilder::new().result_buffer(1).build(),
    );

    let mut handle = runner.start(&ws("core")).unwrap();
    // Let every worker finish and block on the full stream.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut seen = HashSet::new();
    while let Some(result) = with_timeout(handle.next()).await {
        assert!(seen.insert(result.project));
    }
    assert_eq!(seen.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_a_run_reports_every_project_as_cancelled() {
    init_tracing();
    let names = ["a", "b", "core"];
    let mut executor = ScriptedExecutor::new();
    for name in names {
        executor = executor.script(ws(name), Script::pass().after(Duration::from_secs(30)));
    }
    let (runner, _) = fake_runner(
        mock_dirs(&names),
        &["a", "b"],
        executor,
        RunnerConfig::default(),
    );

    let handle = runner.start(&ws("core")).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.cancel();

    let results = with_timeout(handle.collect()).await;
    assert_eq!(results.len(), 3);
    for result in &results {
        assert_eq!(result.exit_code, CANCELLED_EXIT_CODE);
        assert_eq!(result.failure, Some(FailureReason::Cancelled));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_releases_projects_still_waiting_for_a_slot() {
    let names = ["a", "b", "c", "core"];
    let mut executor = ScriptedExecutor::new();
    for name in names {
        executor = executor.script(ws(name), Script::pass().after(Duration::from_secs(30)));
    }
    let (runner, _) = fake_runner(
        mock_dirs(&names),
        &["a", "b", "c"],
        executor.clone(),
        RunnerConfigBuilder::new().max_parallel(1).build(),
    );

    let handle = runner.start(&ws("core")).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.cancel();

    let results = with_timeout(handle.collect()).await;
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.failure == Some(FailureReason::Cancelled)));
    assert_eq!(executor.started().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn parent_token_cancels_runs() {
    let parent = CancellationToken::new();
    let executor = ScriptedExecutor::new()
        .script(ws("core"), Script::pass().after(Duration::from_secs(30)));
    let runner = ImpactTestRunner::new(
        "/ws",
        Arc::new(StaticResolver::new(Vec::new())),
        Arc::new(executor),
        RunnerConfig::default(),
    )
    .with_filesystem(Arc::new(mock_dirs(&["core"])))
    .with_cancellation(parent.clone());

    let handle = runner.start(&ws("core")).unwrap();
    parent.cancel();

    let results = with_timeout(handle.collect()).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].failure, Some(FailureReason::Cancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timeout_is_passed_to_the_executor() {
    let executor = ScriptedExecutor::new()
        .script(ws("slow"), Script::pass().after(Duration::from_secs(30)));
    let (runner, _) = fake_runner(
        mock_dirs(&["slow", "core"]),
        &["slow"],
        executor,
        RunnerConfigBuilder::new()
            .timeout(Duration::from_millis(50))
            .build(),
    );

    let results = with_timeout(runner.start(&ws("core")).unwrap().collect()).await;
    let slow = results.iter().find(|r| r.project == ws("slow")).unwrap();
    assert_eq!(slow.exit_code, TIMED_OUT_EXIT_CODE);
    assert_eq!(
        slow.failure,
        Some(FailureReason::TimedOut(Duration::from_millis(50)))
    );
    let core = results.iter().find(|r| r.project == ws("core")).unwrap();
    assert!(core.passed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn repeated_runs_are_independent() {
    let (runner, resolver) = fake_runner(
        mock_dirs(&["a", "core"]),
        &["a"],
        ScriptedExecutor::new(),
        RunnerConfig::default(),
    );

    let first = with_timeout(runner.start(&ws("core")).unwrap().collect()).await;
    let second = with_timeout(runner.start(&ws("core")).unwrap().collect()).await;

    assert_eq!(projects_of(&first), projects_of(&second));
    assert_eq!(resolver.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropping_the_handle_early_is_harmless() {
    let executor = ScriptedExecutor::new()
        .script(ws("a"), Script::pass().after(Duration::from_millis(50)));
    let (runner, _) = fake_runner(
        mock_dirs(&["a", "core"]),
        &["a"],
        executor.clone(),
        RunnerConfig::default(),
    );

    drop(runner.start(&ws("core")).unwrap());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(executor.started().len(), 2);
}

#[test]
fn start_outside_a_runtime_is_an_error() {
    let (runner, resolver) = fake_runner(
        mock_dirs(&["core"]),
        &[],
        ScriptedExecutor::new(),
        RunnerConfig::default(),
    );

    let err = runner.start(&ws("core")).unwrap_err();
    assert!(matches!(err, RippleError::NoRuntime));
    assert_eq!(resolver.calls(), 0);
}
