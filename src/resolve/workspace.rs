// src/resolve/workspace.rs

//! Manifest-based impact resolver.
//!
//! Scans a workspace for directories carrying a manifest file, links them by
//! the dependency names in those manifests and answers "who depends on this
//! project?" with a breadth-first walk of the resulting graph.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info, warn};

use crate::errors::{Result, RippleError};
use crate::fs::FileSystem;

use super::graph::DependencyGraph;
use super::manifest::PackageManifest;
use super::ImpactResolver;

/// Settings for project discovery, usually taken from `[workspace]`.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// File name that marks a directory as a project (e.g. `package.json`).
    pub manifest: String,
    pub include_dev_dependencies: bool,
    /// Directory levels below the root that are searched.
    pub max_depth: usize,
    /// Glob patterns, relative to the root, for directories to skip.
    pub exclude: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            manifest: "package.json".to_string(),
            include_dev_dependencies: true,
            max_depth: 2,
            exclude: vec![
                "**/node_modules".to_string(),
                "**/.git".to_string(),
                "**/target".to_string(),
            ],
        }
    }
}

/// A project found during discovery.
#[derive(Debug, Clone)]
pub struct WorkspaceProject {
    pub dir: PathBuf,
    pub dir_name: String,
    pub manifest: PackageManifest,
}

/// Find every project under `root`, in sorted path order.
///
/// The root itself is never a project; hidden directories and excluded paths
/// are not descended into.
pub fn discover_projects(
    fs: &dyn FileSystem,
    root: &Path,
    options: &DiscoveryOptions,
) -> Result<Vec<WorkspaceProject>> {
    if !fs.is_dir(root) {
        return Err(RippleError::Resolution(format!(
            "workspace root {} is not a readable directory",
            root.display()
        )));
    }

    let excludes = build_excludes(&options.exclude)?;
    let mut projects = Vec::new();
    visit_dir(fs, root, root, 1, options, &excludes, &mut projects)?;

    debug!(
        root = %root.display(),
        count = projects.len(),
        "discovered workspace projects"
    );
    Ok(projects)
}

fn visit_dir(
    fs: &dyn FileSystem,
    root: &Path,
    dir: &Path,
    depth: usize,
    options: &DiscoveryOptions,
    excludes: &GlobSet,
    projects: &mut Vec<WorkspaceProject>,
) -> Result<()> {
    let children = fs
        .read_dirs(dir)
        .map_err(|e| RippleError::Resolution(format!("{e:#}")))?;

    for child in children {
        let Some(dir_name) = child.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if dir_name.starts_with('.') {
            continue;
        }
        let relative = child.strip_prefix(root).unwrap_or(&child);
        if excludes.is_match(relative) {
            debug!(dir = %child.display(), "skipping excluded directory");
            continue;
        }

        let manifest_path = child.join(&options.manifest);
        if fs.is_file(&manifest_path) {
            let text = fs
                .read_to_string(&manifest_path)
                .map_err(|e| RippleError::Resolution(format!("{e:#}")))?;
            let manifest = PackageManifest::from_json(&text).map_err(|e| {
                RippleError::Resolution(format!("parsing {}: {e}", manifest_path.display()))
            })?;
            projects.push(WorkspaceProject {
                dir: child.clone(),
                dir_name: dir_name.to_string(),
                manifest,
            });
        }

        if depth < options.max_depth {
            visit_dir(fs, root, &child, depth + 1, options, excludes, projects)?;
        }
    }

    Ok(())
}

fn build_excludes(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            RippleError::ConfigError(format!("invalid exclude pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| RippleError::ConfigError(format!("building exclude patterns: {e}")))
}

/// [`ImpactResolver`] backed by the workspace's manifest files.
///
/// The workspace is re-scanned on every call; nothing is cached between runs.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    fs: Arc<dyn FileSystem>,
    options: DiscoveryOptions,
}

impl ManifestResolver {
    pub fn new(fs: Arc<dyn FileSystem>, options: DiscoveryOptions) -> Self {
        Self { fs, options }
    }

    /// Locate the changed project: by canonical path first, then by package
    /// or directory name.
    fn locate(&self, projects: &[WorkspaceProject], changed: &Path) -> Option<usize> {
        if let Ok(wanted) = self.fs.canonicalize(changed) {
            let by_path = projects.iter().position(|p| {
                self.fs
                    .canonicalize(&p.dir)
                    .map(|dir| dir == wanted)
                    .unwrap_or(false)
            });
            if by_path.is_some() {
                return by_path;
            }
        }

        let name = changed.file_name()?.to_str()?;
        projects
            .iter()
            .position(|p| p.manifest.name == name)
            .or_else(|| projects.iter().position(|p| p.dir_name == name))
    }
}

impl ImpactResolver for ManifestResolver {
    fn resolve(&self, workspace_root: &Path, changed_project: &Path) -> Result<Vec<PathBuf>> {
        let projects = discover_projects(self.fs.as_ref(), workspace_root, &self.options)?;

        let Some(changed_idx) = self.locate(&projects, changed_project) else {
            warn!(
                project = %changed_project.display(),
                "changed project has no manifest in the workspace; assuming no dependents"
            );
            return Ok(Vec::new());
        };

        let graph = DependencyGraph::build(&projects, self.options.include_dev_dependencies);
        let dependents: Vec<PathBuf> = graph
            .transitive_dependents(changed_idx)
            .into_iter()
            .map(|idx| projects[idx].dir.clone())
            .collect();

        info!(
            project = %projects[changed_idx].dir.display(),
            direct = graph.direct_dependents(changed_idx).len(),
            total = dependents.len(),
            "resolved dependent projects"
        );
        Ok(dependents)
    }
}
