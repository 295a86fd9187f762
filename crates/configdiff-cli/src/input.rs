//! Reading and parsing one side of a comparison.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use configdiff_core::{Format, Node};
use tracing::debug;

use crate::InputFormat;

/// Path argument that stands for standard input.
pub(crate) const STDIN: &str = "-";

pub(crate) fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN
}

/// Name used for `path` in messages.
pub(crate) fn label(path: &Path) -> String {
    if is_stdin(path) {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

/// Reads `path` (or stdin) and parses it as `requested`, detecting the
/// format when `requested` is [`InputFormat::Auto`].
pub(crate) fn load(path: &Path, requested: InputFormat) -> Result<Node> {
    let data = read(path)?;
    let format = match requested.format() {
        Some(format) => format,
        None => {
            let named = (!is_stdin(path)).then_some(path);
            Format::detect(named, &data).with_context(|| {
                format!(
                    "unable to detect format for {}\nHint: specify the format explicitly with --format",
                    label(path)
                )
            })?
        }
    };
    debug!(input = %label(path), %format, bytes = data.len(), "parsing input");
    format.parse(&data).with_context(|| format!("failed to parse {} as {format}", label(path)))
}

fn read(path: &Path) -> Result<Vec<u8>> {
    if is_stdin(path) {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer).context("failed to read from stdin")?;
        return Ok(buffer);
    }
    fs::read(path).with_context(|| format!("failed to read file {}", path.display()))
}
