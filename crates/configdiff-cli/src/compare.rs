//! File and directory comparison.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use configdiff_core::Format;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::input;
use crate::output;
use crate::settings::Settings;

/// Rendered result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub output: String,
    pub has_changes: bool,
}

/// Compares two files, or two directories when `--recursive` is set.
pub(crate) fn run(old: &Path, new: &Path, settings: &Settings) -> Result<Outcome> {
    match (is_dir(old), is_dir(new)) {
        (true, true) => {
            if !settings.recursive {
                bail!("comparing directories requires --recursive flag");
            }
            compare_directories(old, new, settings)
        }
        (true, false) => bail!(
            "cannot compare directory {} with file {}",
            old.display(),
            input::label(new)
        ),
        (false, true) => bail!(
            "cannot compare file {} with directory {}",
            input::label(old),
            new.display()
        ),
        (false, false) => compare_files(old, new, settings),
    }
}

fn is_dir(path: &Path) -> bool {
    !input::is_stdin(path) && path.is_dir()
}

pub(crate) fn compare_files(old: &Path, new: &Path, settings: &Settings) -> Result<Outcome> {
    if input::is_stdin(old) && input::is_stdin(new) {
        bail!("cannot read both inputs from stdin\nHint: pass at least one file path");
    }
    let old_doc = input::load(old, settings.old_format)?;
    let new_doc = input::load(new, settings.new_format)?;
    let changes = configdiff_core::compare(&old_doc, &new_doc, &settings.options);
    debug!(old = %input::label(old), new = %input::label(new), changes = changes.len(), "compared files");
    Ok(Outcome { output: output::render(&changes, settings)?, has_changes: !changes.is_empty() })
}

/// Compares every supported file under two directory trees.
///
/// Files present on one side only count as changes. A file that fails to
/// load is reported inline and skipped.
pub(crate) fn compare_directories(old: &Path, new: &Path, settings: &Settings) -> Result<Outcome> {
    let old_files = collect_config_files(old)
        .with_context(|| format!("failed to scan old directory {}", old.display()))?;
    let new_files = collect_config_files(new)
        .with_context(|| format!("failed to scan new directory {}", new.display()))?;

    let mut out = String::new();
    let mut has_changes = false;
    let (mut compared, mut added, mut removed) = (0usize, 0usize, 0usize);

    for rel in old_files.union(&new_files) {
        let shown = rel.display();
        match (old_files.contains(rel), new_files.contains(rel)) {
            (true, true) => {
                let _ = writeln!(out, "\n=== {shown} ===");
                match compare_files(&old.join(rel), &new.join(rel), settings) {
                    Ok(file) => {
                        compared += 1;
                        has_changes |= file.has_changes;
                        out.push_str(&file.output);
                    }
                    Err(err) => {
                        warn!(file = %shown, "skipping file: {err:#}");
                        let _ = writeln!(out, "Error: {err:#}");
                    }
                }
            }
            (false, true) => {
                added += 1;
                has_changes = true;
                let _ = writeln!(out, "\n+++ {shown} (added)");
            }
            (_, false) => {
                removed += 1;
                has_changes = true;
                let _ = writeln!(out, "\n--- {shown} (removed)");
            }
        }
    }

    let _ = writeln!(out, "\nSummary: {compared} files compared, {added} added, {removed} removed");
    info!(compared, added, removed, "compared directories");
    Ok(Outcome { output: out, has_changes })
}

/// Relative paths of all files with a supported extension under `root`.
fn collect_config_files(root: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() || Format::from_extension(entry.path()).is_none() {
            continue;
        }
        let rel = entry.path().strip_prefix(root)?;
        files.insert(rel.to_path_buf());
    }
    Ok(files)
}
