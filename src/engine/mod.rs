// src/engine/mod.rs

//! Orchestration engine for ripple.
//!
//! This module ties together:
//! - impact resolution (one synchronous resolver call per run)
//! - the impact set (dependents + the changed project, validated)
//! - concurrent fan-out of one executor invocation per project
//! - fan-in of results onto a stream the caller drains
//!
//! [`runner`] holds the orchestration, [`impact_set`] the validated project
//! list and [`summary`] the aggregate verdict.

pub mod impact_set;
pub mod runner;
pub mod summary;

pub use impact_set::ImpactSet;
pub use runner::{ImpactTestRunner, RunHandle, RunnerConfig};
pub use summary::RunSummary;
