//! Plan and diagnostics output.
//!
//! The external emitter consumes two JSON artifacts: the emission plan
//! (only when the build succeeded) and the diagnostics report (always).
//! An error-bearing sink means no plan file is ever written.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tsgen_common::Diagnostic;
use tsgen_plan::ConstraintFinding;

use crate::driver::BuildOutcome;

#[derive(Serialize)]
struct DiagnosticsReport<'a> {
    error_count: usize,
    diagnostics: &'a [Diagnostic],
    findings: &'a [ConstraintFinding],
}

pub fn write_outputs(out_dir: &Path, outcome: &BuildOutcome) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory '{}'", out_dir.display()))?;
    let mut written = Vec::new();

    let report = DiagnosticsReport {
        error_count: outcome.sink.error_count(),
        diagnostics: outcome.sink.diagnostics(),
        findings: &outcome.findings,
    };
    let diagnostics_path = out_dir.join("diagnostics.json");
    let text = serde_json::to_string_pretty(&report).context("serializing diagnostics")?;
    std::fs::write(&diagnostics_path, text)
        .with_context(|| format!("writing '{}'", diagnostics_path.display()))?;
    written.push(diagnostics_path);

    if let Some(plan) = &outcome.plan {
        let plan_path = out_dir.join("plan.json");
        let text = serde_json::to_string_pretty(plan).context("serializing emission plan")?;
        std::fs::write(&plan_path, text)
            .with_context(|| format!("writing '{}'", plan_path.display()))?;
        written.push(plan_path);
    }

    info!(files = written.len(), dir = %out_dir.display(), "outputs written");
    Ok(written)
}
