// src/engine/impact_set.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, RippleError};
use crate::fs::FileSystem;

/// The projects one run will test: the dependents of the changed project in
/// discovery order, followed by the changed project itself.
///
/// Guarantees, checked at construction:
/// - every entry is an existing directory;
/// - no two entries refer to the same directory (compared canonically);
/// - never empty; the changed project is always the last entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpactSet {
    projects: Vec<PathBuf>,
}

impl ImpactSet {
    pub fn build(fs: &dyn FileSystem, dependents: Vec<PathBuf>, changed: &Path) -> Result<Self> {
        let changed_key = canonical_dir(fs, changed)?;

        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut projects = Vec::with_capacity(dependents.len() + 1);

        for dir in dependents {
            let key = canonical_dir(fs, &dir)?;
            if key == changed_key || !seen.insert(key) {
                debug!(project = %dir.display(), "dropping duplicate project from impact set");
                continue;
            }
            projects.push(dir);
        }
        projects.push(changed.to_path_buf());

        Ok(Self { projects })
    }

    pub fn projects(&self) -> &[PathBuf] {
        &self.projects
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Always false for a constructed set; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn changed_project(&self) -> &Path {
        // `build` always appends the changed project.
        self.projects.last().map(PathBuf::as_path).unwrap_or(Path::new(""))
    }

    /// Projects affected by the change, excluding the changed project.
    pub fn dependents(&self) -> &[PathBuf] {
        &self.projects[..self.projects.len().saturating_sub(1)]
    }
}

impl<'a> IntoIterator for &'a ImpactSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.projects.iter()
    }
}

fn canonical_dir(fs: &dyn FileSystem, dir: &Path) -> Result<PathBuf> {
    if !fs.is_dir(dir) {
        return Err(RippleError::ProjectNotFound(dir.to_path_buf()));
    }
    fs.canonicalize(dir)
        .map_err(|_| RippleError::ProjectNotFound(dir.to_path_buf()))
}
