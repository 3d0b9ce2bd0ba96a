// src/resolve/mod.rs

//! Dependency impact resolution.
//!
//! The runner only knows the [`ImpactResolver`] contract. [`workspace`]
//! provides the stock implementation that reads `package.json`-style
//! manifests; anything else satisfying the trait can be plugged in.
//!
//! - [`manifest`] is the manifest data model.
//! - [`graph`] links projects and walks dependents.
//! - [`workspace`] discovers projects and implements the resolver.

use std::path::{Path, PathBuf};

use crate::errors::Result;

pub mod graph;
pub mod manifest;
pub mod workspace;

pub use graph::DependencyGraph;
pub use manifest::PackageManifest;
pub use workspace::{discover_projects, DiscoveryOptions, ManifestResolver, WorkspaceProject};

/// Answers "which projects are affected if this one changes?".
///
/// Implementations return the directories of every project that depends on
/// `changed_project`, directly or transitively, without duplicates and
/// without `changed_project` itself. Errors abort the run before any test
/// command starts.
pub trait ImpactResolver: Send + Sync {
    fn resolve(&self, workspace_root: &Path, changed_project: &Path) -> Result<Vec<PathBuf>>;
}
