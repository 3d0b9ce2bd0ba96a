// src/report.rs

//! Caller-facing output: one entry per project as results arrive, then the
//! aggregate verdict.

use std::io::Write;

use serde::Serialize;

use crate::engine::{ImpactSet, RunSummary};
use crate::errors::Result;
use crate::exec::ProjectTestResult;
use crate::types::ReportFormat;

#[derive(Debug, Serialize)]
struct ResultRecord<'a> {
    kind: &'static str,
    project: String,
    passed: bool,
    exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
    elapsed_ms: u64,
    output: &'a str,
}

#[derive(Debug, Serialize)]
struct SummaryRecord {
    kind: &'static str,
    total: usize,
    passed: usize,
    failed: Vec<String>,
    exit_code: i32,
}

/// Streams results to a writer in the chosen format.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    out: W,
    format: ReportFormat,
    show_output: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: ReportFormat, show_output: bool) -> Self {
        Self {
            out,
            format,
            show_output,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print the impact set without running anything (`--dry-run`).
    pub fn impact_set(&mut self, impact: &ImpactSet) -> Result<()> {
        match self.format {
            ReportFormat::Text => {
                writeln!(
                    self.out,
                    "ripple dry-run: {} project(s) affected by {}",
                    impact.len(),
                    impact.changed_project().display()
                )?;
                for project in impact.dependents() {
                    writeln!(self.out, "  - {}", project.display())?;
                }
                writeln!(self.out, "  - {} (changed)", impact.changed_project().display())?;
            }
            ReportFormat::Json => {
                let projects: Vec<String> = impact
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                serde_json::to_writer(
                    &mut self.out,
                    &serde_json::json!({
                        "kind": "impact_set",
                        "changed": impact.changed_project().display().to_string(),
                        "projects": projects,
                    }),
                )?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    /// Report one project's result.
    pub fn result(&mut self, result: &ProjectTestResult) -> Result<()> {
        match self.format {
            ReportFormat::Text => self.text_result(result)?,
            ReportFormat::Json => {
                let output = result.output_lossy();
                let record = ResultRecord {
                    kind: "result",
                    project: result.project.display().to_string(),
                    passed: result.passed(),
                    exit_code: result.exit_code,
                    failure: result.failure.as_ref().map(ToString::to_string),
                    elapsed_ms: result.elapsed.as_millis() as u64,
                    output: &output,
                };
                serde_json::to_writer(&mut self.out, &record)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn text_result(&mut self, result: &ProjectTestResult) -> Result<()> {
        let verdict = if result.passed() { "PASS" } else { "FAIL" };
        write!(
            self.out,
            "{verdict} {} (exit {}, {:.2}s)",
            result.project.display(),
            result.exit_code,
            result.elapsed.as_secs_f64()
        )?;
        if let Some(reason) = &result.failure {
            write!(self.out, ": {reason}")?;
        }
        writeln!(self.out)?;

        if (!result.passed() || self.show_output) && !result.output.is_empty() {
            for line in result.output_lossy().lines() {
                writeln!(self.out, "    | {line}")?;
            }
        }
        Ok(())
    }

    /// Report the aggregate verdict.
    pub fn summary(&mut self, summary: &RunSummary) -> Result<()> {
        match self.format {
            ReportFormat::Text => {
                writeln!(
                    self.out,
                    "{} of {} project(s) passed",
                    summary.passed, summary.total
                )?;
                if !summary.all_passed() {
                    writeln!(self.out, "failed:")?;
                    for project in &summary.failed {
                        writeln!(self.out, "  - {}", project.display())?;
                    }
                }
            }
            ReportFormat::Json => {
                let record = SummaryRecord {
                    kind: "summary",
                    total: summary.total,
                    passed: summary.passed,
                    failed: summary
                        .failed
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect(),
                    exit_code: summary.exit_code(),
                };
                serde_json::to_writer(&mut self.out, &record)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}
