//! `cfgpatch apply` - Apply a patch plan
//!
//! ## Usage
//!
//! ```bash
//! cfgpatch apply baseline.yaml
//! cfgpatch apply baseline.json --dry-run --format json
//! ```

use super::OutputFormat;
use anyhow::{Context, Result};
use cfgpatch::{PatchOptions, PatchPlan, PatchSession, PlanReport};
use std::path::Path;

/// Loads `plan` and applies it in one session
pub fn apply_plan(plan: &Path, options: PatchOptions, format: OutputFormat) -> Result<String> {
    let loaded = PatchPlan::load(plan)?;
    tracing::debug!(plan = %plan.display(), assignments = loaded.len(), "Applying plan");

    let dry_run = options.dry_run;
    let mut session = PatchSession::new(options);
    let report = loaded
        .apply(&mut session)
        .with_context(|| format!("Failed to apply plan {}", plan.display()))?;

    render_report(&report, format, dry_run)
}

/// Formats a plan report for stdout
pub fn render_report(report: &PlanReport, format: OutputFormat, dry_run: bool) -> Result<String> {
    match format {
        OutputFormat::Json => report.to_json().context("Failed to serialize report"),
        OutputFormat::Text => {
            let mut text = report.to_text();
            if dry_run {
                text.push_str(" (dry run)");
            }
            Ok(text)
        }
    }
}
