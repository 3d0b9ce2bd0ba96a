// src/config/validate.rs

use globset::Glob;
use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, RippleError};
use crate::exec::DEFAULT_OUTPUT_GRACE;
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RippleError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let timeout = raw
            .runner
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
            .map_err(|e| RippleError::ConfigError(format!("[runner].timeout: {e}")))?;
        let output_grace = raw
            .runner
            .output_grace
            .as_deref()
            .map(parse_duration)
            .transpose()
            .map_err(|e| RippleError::ConfigError(format!("[runner].output_grace: {e}")))?
            .unwrap_or(DEFAULT_OUTPUT_GRACE);
        Ok(ConfigFile::new_unchecked(
            raw.workspace,
            raw.runner,
            raw.report,
            timeout,
            output_grace,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_workspace(cfg)?;
    validate_runner(cfg)?;
    Ok(())
}

fn validate_workspace(cfg: &RawConfigFile) -> Result<()> {
    if cfg.workspace.root.trim().is_empty() {
        return Err(RippleError::ConfigError(
            "[workspace].root must not be empty".to_string(),
        ));
    }

    let manifest = cfg.workspace.manifest.trim();
    if manifest.is_empty() || manifest.contains('/') || manifest.contains('\\') {
        return Err(RippleError::ConfigError(format!(
            "[workspace].manifest must be a plain file name (got {:?})",
            cfg.workspace.manifest
        )));
    }

    if cfg.workspace.max_depth == 0 {
        return Err(RippleError::ConfigError(
            "[workspace].max_depth must be >= 1 (got 0)".to_string(),
        ));
    }

    for pattern in &cfg.workspace.exclude {
        Glob::new(pattern).map_err(|e| {
            RippleError::ConfigError(format!(
                "[workspace].exclude has invalid pattern '{}': {}",
                pattern, e
            ))
        })?;
    }

    Ok(())
}

fn validate_runner(cfg: &RawConfigFile) -> Result<()> {
    if cfg.runner.max_parallel == Some(0) {
        return Err(RippleError::ConfigError(
            "[runner].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.runner.result_buffer == Some(0) {
        return Err(RippleError::ConfigError(
            "[runner].result_buffer must be >= 1 (got 0)".to_string(),
        ));
    }

    // An empty command is reported per project as an invalid invocation, not
    // rejected here.
    if cfg.runner.command.is_empty() {
        warn!("[runner].command is empty; every project will report an invalid command");
    }

    Ok(())
}
