// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod report;
pub mod resolve;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::load_or_default;
use crate::config::model::ConfigFile;
use crate::engine::{ImpactTestRunner, RunSummary, RunnerConfig};
use crate::errors::{Result, RippleError};
use crate::exec::ProcessExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::report::Reporter;
use crate::resolve::{discover_projects, DiscoveryOptions, ManifestResolver};
use crate::types::{parse_duration, Parallelism, ReportFormat};

/// Effective settings for one CLI invocation: the config file with command
/// line overrides applied.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub root: PathBuf,
    pub discovery: DiscoveryOptions,
    pub runner: RunnerConfig,
    pub format: ReportFormat,
    pub show_output: bool,
}

impl RunSettings {
    pub fn from_config(cfg: &ConfigFile, args: &CliArgs) -> Result<Self> {
        let mut runner = cfg.runner_config();

        if !args.command.is_empty() {
            runner.command = args.command.clone();
        }
        if let Some(n) = args.max_parallel {
            if n == 0 {
                return Err(RippleError::ConfigError(
                    "--max-parallel must be at least 1".to_string(),
                ));
            }
            runner.parallelism = Parallelism::Limited(n);
        }
        if let Some(ref raw) = args.timeout {
            let timeout = parse_duration(raw)
                .map_err(|e| RippleError::ConfigError(format!("--timeout: {e}")))?;
            runner.timeout = Some(timeout);
        }

        Ok(Self {
            root: args
                .root
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| cfg.workspace_root()),
            discovery: cfg.discovery_options(),
            runner,
            format: args.format.unwrap_or(cfg.report.format),
            show_output: args.show_output || cfg.report.show_output,
        })
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the manifest resolver and the process executor
/// - the impact test runner
/// - Ctrl-C handling
/// - streaming results to stdout
pub async fn run(args: CliArgs) -> Result<RunSummary> {
    let cfg = load_or_default(args.config.as_deref().map(Path::new))?;
    let settings = RunSettings::from_config(&cfg, &args)?;
    debug!(?settings, "effective settings");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let changed = locate_project(fs.as_ref(), &settings, &args.project)?;

    let resolver = Arc::new(ManifestResolver::new(
        Arc::clone(&fs),
        settings.discovery.clone(),
    ));
    let runner = ImpactTestRunner::new(
        settings.root.clone(),
        resolver,
        Arc::new(ProcessExecutor::new()),
        settings.runner.clone(),
    )
    .with_filesystem(Arc::clone(&fs));

    let mut reporter = Reporter::new(std::io::stdout(), settings.format, settings.show_output);

    if args.dry_run {
        let impact = runner.impact_set(&changed)?;
        reporter.impact_set(&impact)?;
        return Ok(RunSummary::new());
    }

    let mut handle = runner.start(&changed)?;

    // Ctrl-C -> cancel the run; every project still reports.
    let ctrl_c = {
        let token = handle.cancellation_token();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; cancelling run");
            token.cancel();
        })
    };

    let mut summary = RunSummary::new();
    while let Some(result) = handle.next().await {
        summary.record(&result);
        reporter.result(&result)?;
    }
    ctrl_c.abort();

    reporter.summary(&summary)?;
    info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed.len(),
        "impact test run complete"
    );
    Ok(summary)
}

/// Turn the `PROJECT` argument into a directory.
///
/// Tried in order: an absolute path, a path under the workspace root, a path
/// relative to the current directory, then a package or directory name found
/// by scanning the workspace.
fn locate_project(fs: &dyn FileSystem, settings: &RunSettings, arg: &str) -> Result<PathBuf> {
    let given = PathBuf::from(arg);
    if given.is_absolute() {
        return Ok(given);
    }

    let under_root = settings.root.join(&given);
    if fs.is_dir(&under_root) {
        return Ok(under_root);
    }
    if fs.is_dir(&given) {
        return Ok(given);
    }

    let projects = discover_projects(fs, &settings.root, &settings.discovery)?;
    projects
        .iter()
        .find(|p| p.manifest.name == arg)
        .or_else(|| projects.iter().find(|p| p.dir_name == arg))
        .map(|p| p.dir.clone())
        .ok_or(RippleError::ProjectNotFound(under_root))
}
