//! Output rendering and GitHub Actions integration.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use configdiff_core::{report, Change, Patch};
use rand::Rng;
use tracing::{debug, warn};

use crate::compare::Outcome;
use crate::settings::Settings;
use crate::OutputFormat;

/// Renders `changes` in the configured output format, newline terminated.
pub(crate) fn render(changes: &[Change], settings: &Settings) -> Result<String> {
    let mut out = match settings.output {
        OutputFormat::Report | OutputFormat::Compact => {
            report::render(changes, &settings.report_options())
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(changes).context("failed to serialize changes to JSON")?
        }
        OutputFormat::Patch => serde_json::to_string_pretty(&Patch::from_changes(changes))
            .context("failed to serialize patch to JSON")?,
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Appends `has-changes` and `diff-output` to a `GITHUB_OUTPUT` file.
/// Failures are logged and otherwise ignored.
pub(crate) fn append_github_output(target: &Path, outcome: &Outcome) {
    match write_github_output(target, outcome) {
        Ok(()) => debug!(path = %target.display(), "wrote GitHub Actions outputs"),
        Err(err) => warn!(path = %target.display(), "failed to write GitHub Actions outputs: {err:#}"),
    }
}

fn write_github_output(target: &Path, outcome: &Outcome) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(target)
        .with_context(|| format!("failed to open {}", target.display()))?;
    let delimiter = heredoc_delimiter();
    write!(
        file,
        "has-changes={}\ndiff-output<<{delimiter}\n{}\n{delimiter}\n",
        outcome.has_changes,
        outcome.output.trim_end_matches('\n'),
    )?;
    Ok(())
}

/// Random heredoc delimiter so diff content cannot terminate the block.
fn heredoc_delimiter() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    format!("ghadelimiter_{}", hex::encode(bytes))
}
