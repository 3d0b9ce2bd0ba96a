#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use ripple::engine::RunnerConfig;
use ripple::fs::mock::MockFileSystem;
use ripple::types::Parallelism;
use tempfile::TempDir;

/// Render a minimal `package.json`.
pub fn package_json(name: &str, deps: &[&str], dev_deps: &[&str]) -> String {
    fn section(deps: &[&str]) -> String {
        deps.iter()
            .map(|d| format!("\"{d}\": \"*\""))
            .collect::<Vec<_>>()
            .join(", ")
    }

    format!(
        r#"{{
  "name": "{name}",
  "version": "1.0.0",
  "scripts": {{ "test": "echo ok" }},
  "dependencies": {{ {} }},
  "devDependencies": {{ {} }}
}}
"#,
        section(deps),
        section(dev_deps)
    )
}

/// Builds a throwaway workspace on disk: one directory per project, each
/// with a `package.json`.
pub struct WorkspaceBuilder {
    dir: TempDir,
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp workspace"),
        }
    }

    /// Add a project at `rel` (relative to the root) named `name`.
    pub fn project(self, rel: &str, name: &str, deps: &[&str]) -> Self {
        self.project_with_dev(rel, name, deps, &[])
    }

    pub fn project_with_dev(self, rel: &str, name: &str, deps: &[&str], dev: &[&str]) -> Self {
        let dir = self.dir.path().join(rel);
        std::fs::create_dir_all(&dir).expect("create project dir");
        std::fs::write(dir.join("package.json"), package_json(name, deps, dev))
            .expect("write package.json");
        self
    }

    /// Add a plain directory without a manifest.
    pub fn dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.dir.path().join(rel)).expect("create dir");
        self
    }

    /// Write an arbitrary file below the root.
    pub fn file(self, rel: &str, contents: &str) -> Self {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(path, contents).expect("write file");
        self
    }

    pub fn build(self) -> Workspace {
        Workspace { dir: self.dir }
    }
}

impl Default for WorkspaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A workspace on disk; removed when dropped.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Canonical form of `rel`, for comparing against resolver output.
    pub fn canonical(&self, rel: &str) -> PathBuf {
        std::fs::canonicalize(self.path(rel)).expect("canonicalize workspace path")
    }
}

/// Builds an in-memory workspace rooted at `/ws`.
pub struct MockWorkspaceBuilder {
    fs: MockFileSystem,
    root: PathBuf,
}

impl MockWorkspaceBuilder {
    pub fn new() -> Self {
        let fs = MockFileSystem::new();
        let root = PathBuf::from("/ws");
        fs.add_dir(&root);
        Self { fs, root }
    }

    pub fn project(self, rel: &str, name: &str, deps: &[&str]) -> Self {
        self.project_with_dev(rel, name, deps, &[])
    }

    pub fn project_with_dev(self, rel: &str, name: &str, deps: &[&str], dev: &[&str]) -> Self {
        self.fs.add_file(
            self.root.join(rel).join("package.json"),
            package_json(name, deps, dev),
        );
        self
    }

    pub fn file(self, rel: &str, contents: &str) -> Self {
        self.fs.add_file(self.root.join(rel), contents.as_bytes().to_vec());
        self
    }

    pub fn dir(self, rel: &str) -> Self {
        self.fs.add_dir(self.root.join(rel));
        self
    }

    pub fn build(self) -> (MockFileSystem, PathBuf) {
        (self.fs, self.root)
    }
}

impl Default for MockWorkspaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RunnerConfig`.
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RunnerConfig::default(),
        }
    }

    pub fn command(mut self, tokens: &[&str]) -> Self {
        self.config.command = tokens.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.config.parallelism = Parallelism::Limited(n);
        self
    }

    pub fn result_buffer(mut self, n: usize) -> Self {
        self.config.result_buffer = Some(n);
        self
    }

    pub fn timeout(mut self, after: Duration) -> Self {
        self.config.timeout = Some(after);
        self
    }

    pub fn build(self) -> RunnerConfig {
        self.config
    }
}

impl Default for RunnerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
