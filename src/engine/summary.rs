// src/engine/summary.rs

use std::path::PathBuf;

use crate::exec::ProjectTestResult;

/// Aggregate view over the results of one run.
///
/// Whether a failing project fails the whole run is the caller's policy; the
/// CLI uses [`RunSummary::exit_code`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    /// Failing projects, in the order their results arrived.
    pub failed: Vec<PathBuf>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ProjectTestResult>) -> Self {
        let mut summary = Self::new();
        for result in results {
            summary.record(result);
        }
        summary
    }

    pub fn record(&mut self, result: &ProjectTestResult) {
        self.total += 1;
        if result.passed() {
            self.passed += 1;
        } else {
            self.failed.push(result.project.clone());
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }

    /// `0` when every project passed, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }
}
