// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only run-level failures live here. Anything that goes wrong while testing a
//! single project is recorded inside its `ProjectTestResult` instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Project not found: {}", .0.display())]
    ProjectNotFound(PathBuf),

    #[error("Impact resolution failed: {0}")]
    Resolution(String),

    #[error("No Tokio runtime available to launch project tests")]
    NoRuntime,

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RippleError>;
