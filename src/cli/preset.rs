//! `cfgpatch preset` - Built-in tuning presets
//!
//! ## Usage
//!
//! ```bash
//! cfgpatch preset list
//! cfgpatch preset show ssh-hardening
//! cfgpatch preset apply mysql-network mysql-innodb --set innodb_buffer_pool_size=4G
//! ```

use super::OutputFormat;
use super::apply::render_report;
use anyhow::{Context, Result};
use cfgpatch::{PRESETS, PatchOptions, PatchSession, Selection, find_preset, unknown_preset};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Lists every built-in preset
pub fn list_presets(format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let descriptors: Vec<_> = PRESETS.iter().map(|p| &p.descriptor).collect();
            serde_json::to_string_pretty(&descriptors).context("Failed to serialize presets")
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for preset in PRESETS {
                let d = &preset.descriptor;
                let _ = writeln!(
                    out,
                    "{:<16} {:<14} {}",
                    d.flag,
                    d.category.to_string(),
                    d.description
                );
            }
            Ok(out.trim_end().to_string())
        }
    }
}

/// Describes one preset and its assignments
pub fn show_preset(flag: &str) -> Result<String> {
    let preset = find_preset(flag).ok_or_else(|| unknown_preset(flag))?;

    let d = &preset.descriptor;
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", d.name, d.flag);
    let _ = writeln!(out, "{}", d.description);
    let _ = write!(out, "target: {} [{}]", preset.target, preset.syntax);
    if let Some(section) = preset.section {
        let _ = write!(out, " [{section}]");
    }
    for (key, value) in preset.assignments {
        let _ = write!(out, "\n  {}", preset.syntax.render_pair(key, value));
    }
    Ok(out)
}

/// Applies the selected presets in one session
pub fn apply_presets(
    flags: &[String],
    root: Option<PathBuf>,
    overrides: &[String],
    options: PatchOptions,
    format: OutputFormat,
) -> Result<String> {
    let mut selection = Selection::new();
    if let Some(root) = root {
        selection = selection.with_root(root);
    }
    for flag in flags {
        selection.select(flag)?;
    }
    for spec in overrides {
        selection.override_value(spec)?;
    }

    let plan = selection.to_plan()?;
    let dry_run = options.dry_run;
    let mut session = PatchSession::new(options);
    let report = plan
        .apply(&mut session)
        .with_context(|| format!("Failed to apply presets {}", flags.join(", ")))?;

    render_report(&report, format, dry_run)
}
