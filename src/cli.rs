// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::ReportFormat;

/// Command-line arguments for `ripple`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ripple",
    version,
    about = "Run tests in every workspace project affected by a change.",
    long_about = None
)]
pub struct CliArgs {
    /// The project that changed (directory, relative to the workspace root or
    /// absolute).
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// Command to run inside each affected project (overrides the configured
    /// `[runner].command`). Pass it after `--`, e.g. `ripple api -- npm test`.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Ripple.toml` in the current working directory. A missing
    /// default file is not an error; built-in defaults are used instead.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Workspace root to scan for projects (overrides `[workspace].root`).
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,

    /// Maximum number of project tests running at once (default: unbounded).
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// Per-project timeout, e.g. `90s` or `10m`.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Report format for per-project results.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Also print captured output of projects whose tests passed.
    #[arg(long)]
    pub show_output: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RIPPLE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the impact set, but don't run any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
