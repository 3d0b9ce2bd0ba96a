// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::RunnerConfig;
use crate::exec::DEFAULT_OUTPUT_GRACE;
use crate::resolve::DiscoveryOptions;
use crate::types::{Parallelism, ReportFormat};

/// Top-level configuration as read from a `Ripple.toml` file.
///
/// ```toml
/// [workspace]
/// root = "."
/// manifest = "package.json"
/// exclude = ["**/node_modules", "**/.git"]
///
/// [runner]
/// command = ["npm", "test"]
/// max_parallel = 8
/// timeout = "10m"
/// output_grace = "2s"
///
/// [report]
/// format = "text"
/// ```
///
/// All sections are optional and have reasonable defaults. This is the
/// unvalidated shape; convert it into a [`ConfigFile`] with `TryFrom`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub workspace: WorkspaceSection,

    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub report: ReportSection,
}

/// `[workspace]` section: where projects live and how they are discovered.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceSection {
    /// Workspace root, relative to the current working directory.
    #[serde(default = "default_root")]
    pub root: String,

    /// File name that marks a directory as a project.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Whether `devDependencies` count as dependency edges.
    #[serde(default = "default_true")]
    pub include_dev_dependencies: bool,

    /// How many directory levels below the root are searched for projects.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Glob patterns (relative to the root) for directories never scanned.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_manifest() -> String {
    "package.json".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    2
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/node_modules".to_string(),
        "**/.git".to_string(),
        "**/target".to_string(),
    ]
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            manifest: default_manifest(),
            include_dev_dependencies: default_true(),
            max_depth: default_max_depth(),
            exclude: default_exclude(),
        }
    }
}

/// `[runner]` section: what runs in each affected project and how.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    /// Program and arguments, e.g. `["npm", "test"]`. No shell is involved.
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    /// Upper bound on concurrently running project tests; absent = unbounded.
    #[serde(default)]
    pub max_parallel: Option<usize>,

    /// Capacity of the result stream; absent = available parallelism.
    #[serde(default)]
    pub result_buffer: Option<usize>,

    /// Per-project timeout such as `"90s"`; absent = no timeout.
    #[serde(default)]
    pub timeout: Option<String>,

    /// How long to keep reading a project's output after its process exits;
    /// absent = 2s.
    #[serde(default)]
    pub output_grace: Option<String>,
}

fn default_command() -> Vec<String> {
    vec!["npm".to_string(), "test".to_string()]
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            max_parallel: None,
            result_buffer: None,
            timeout: None,
            output_grace: None,
        }
    }
}

/// `[report]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportSection {
    #[serde(default)]
    pub format: ReportFormat,

    /// Print captured output of passing projects too (failures always print).
    #[serde(default)]
    pub show_output: bool,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `config::validate`),
/// so holders can rely on numeric limits being non-zero and the timeout being
/// parsed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub workspace: WorkspaceSection,
    pub runner: RunnerSection,
    pub report: ReportSection,
    timeout: Option<Duration>,
    output_grace: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        workspace: WorkspaceSection,
        runner: RunnerSection,
        report: ReportSection,
        timeout: Option<Duration>,
        output_grace: Duration,
    ) -> Self {
        Self {
            workspace,
            runner,
            report,
            timeout,
            output_grace,
        }
    }

    /// Parsed `[runner].timeout`.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Parsed `[runner].output_grace`, or the default.
    pub fn output_grace(&self) -> Duration {
        self.output_grace
    }

    pub fn workspace_root(&self) -> PathBuf {
        PathBuf::from(&self.workspace.root)
    }

    /// Runner settings for [`crate::engine::ImpactTestRunner`].
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            command: self.runner.command.clone(),
            parallelism: Parallelism::from(self.runner.max_parallel),
            result_buffer: self.runner.result_buffer,
            timeout: self.timeout,
            output_grace: self.output_grace,
        }
    }

    /// Project discovery settings for the manifest resolver.
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            manifest: self.workspace.manifest.clone(),
            include_dev_dependencies: self.workspace.include_dev_dependencies,
            max_depth: self.workspace.max_depth,
            exclude: self.workspace.exclude.clone(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let raw = RawConfigFile::default();
        Self::new_unchecked(
            raw.workspace,
            raw.runner,
            raw.report,
            None,
            DEFAULT_OUTPUT_GRACE,
        )
    }
}
