// src/fs/mod.rs

//! Read-only view of the workspace.
//!
//! Project discovery and impact-set validation go through [`FileSystem`] so
//! tests can describe a workspace in memory ([`mock::MockFileSystem`]) instead
//! of laying it out on disk.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Resolve to the form used to decide whether two paths name the same
    /// project. Errors when the path does not exist.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Immediate subdirectories of `path` as full paths, sorted. Files are
    /// skipped.
    fn read_dirs(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// [`FileSystem`] over the real disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("resolving {}", path.display()))
    }

    fn read_dirs(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let listing =
            fs::read_dir(path).with_context(|| format!("listing {}", path.display()))?;

        let mut dirs = listing
            .map(|entry| -> Result<Option<PathBuf>> {
                let entry = entry.with_context(|| format!("listing {}", path.display()))?;
                // Symlinked directories count as directories.
                let is_dir = entry.path().is_dir();
                Ok(is_dir.then(|| entry.path()))
            })
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>>>()?;
        dirs.sort();
        Ok(dirs)
    }
}
