//! Human-readable change reports.

use std::fmt::Write as _;

use colored::Colorize;

use crate::{Change, ChangeKind, Node};

/// Controls the layout of a rendered report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportOptions {
    /// Omits the blank separator lines.
    pub compact: bool,
    /// Includes old and new values for each change.
    pub show_values: bool,
    /// Truncates rendered values longer than this many characters. `0` disables truncation.
    pub max_value_length: usize,
    /// Wraps each change line in ANSI colour codes.
    pub color: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::detailed()
    }
}

impl ReportOptions {
    /// Full report with values, truncated at 80 characters.
    #[must_use]
    pub fn detailed() -> Self {
        Self { compact: false, show_values: true, max_value_length: 80, color: false }
    }

    /// Paths only, without separators.
    #[must_use]
    pub fn compact() -> Self {
        Self { compact: true, show_values: false, ..Self::detailed() }
    }

    /// Sets the truncation limit.
    #[must_use]
    pub fn with_max_value_length(mut self, max_value_length: usize) -> Self {
        self.max_value_length = max_value_length;
        self
    }

    /// Enables or disables colour.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Change counts by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Number of additions.
    pub added: usize,
    /// Number of removals.
    pub removed: usize,
    /// Number of modifications.
    pub modified: usize,
    /// Number of moves.
    pub moved: usize,
}

impl Summary {
    /// Counts the changes in `changes`.
    #[must_use]
    pub fn of(changes: &[Change]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change.kind {
                ChangeKind::Add => summary.added += 1,
                ChangeKind::Remove => summary.removed += 1,
                ChangeKind::Modify => summary.modified += 1,
                ChangeKind::Move => summary.moved += 1,
            }
        }
        summary
    }

    /// Total number of changes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified + self.moved
    }
}

/// Renders `changes` as a report.
///
/// ```
/// # use configdiff_core::{report::{render, ReportOptions}, DiffOptions, Node};
/// let old = Node::from_json_str(r#"{"replicas":1,"image":"nginx:1.25"}"#).unwrap();
/// let new = Node::from_json_str(r#"{"replicas":3,"image":"nginx:1.25","debug":true}"#).unwrap();
/// let changes = old.diff(&new, &DiffOptions::default());
/// let report = render(&changes, &ReportOptions::detailed());
/// assert_eq!(
///     report,
///     "Summary: +1 added, ~1 modified (2 total)\n\nChanges:\n  + /debug = true\n\n  ~ /replicas: 1 → 3\n"
/// );
/// assert_eq!(render(&[], &ReportOptions::detailed()), "No changes detected.\n");
/// ```
#[must_use]
pub fn render(changes: &[Change], options: &ReportOptions) -> String {
    if changes.is_empty() {
        return "No changes detected.\n".to_string();
    }

    let mut out = summary_line(&Summary::of(changes));
    if !options.compact {
        out.push('\n');
    }
    out.push_str("Changes:\n");
    for (position, change) in changes.iter().enumerate() {
        let line = change_line(change, options);
        if options.color {
            let _ = writeln!(out, "{}", paint(&line, change.kind));
        } else {
            let _ = writeln!(out, "{line}");
        }
        if !options.compact && position + 1 < changes.len() {
            out.push('\n');
        }
    }
    out
}

fn summary_line(summary: &Summary) -> String {
    let mut parts = Vec::with_capacity(4);
    if summary.added > 0 {
        parts.push(format!("+{} added", summary.added));
    }
    if summary.removed > 0 {
        parts.push(format!("-{} removed", summary.removed));
    }
    if summary.modified > 0 {
        parts.push(format!("~{} modified", summary.modified));
    }
    if summary.moved > 0 {
        parts.push(format!("↔{} moved", summary.moved));
    }
    format!("Summary: {} ({} total)\n", parts.join(", "), summary.total())
}

fn symbol(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Add => "+",
        ChangeKind::Remove => "-",
        ChangeKind::Modify => "~",
        ChangeKind::Move => "↔",
    }
}

fn paint(line: &str, kind: ChangeKind) -> String {
    match kind {
        ChangeKind::Add => line.green().to_string(),
        ChangeKind::Remove => line.red().to_string(),
        ChangeKind::Modify => line.yellow().to_string(),
        ChangeKind::Move => line.cyan().to_string(),
    }
}

fn change_line(change: &Change, options: &ReportOptions) -> String {
    let mut line = format!("  {} {}", symbol(change.kind), change.path);
    if !options.show_values {
        return line;
    }
    let max = options.max_value_length;
    let value = |node: Option<&Node>| display_value(node, max);
    let _ = match change.kind {
        ChangeKind::Add => write!(line, " = {}", value(change.new_value.as_ref())),
        ChangeKind::Remove => write!(line, " (was: {})", value(change.old_value.as_ref())),
        ChangeKind::Modify => write!(
            line,
            ": {} → {}",
            value(change.old_value.as_ref()),
            value(change.new_value.as_ref())
        ),
        ChangeKind::Move => match change.placement.as_ref() {
            Some(placement) => match (placement.old_index, placement.new_index) {
                (Some(from), Some(to)) => write!(line, ": [{from}] → [{to}]"),
                _ => Ok(()),
            },
            None => Ok(()),
        },
    };
    line
}

/// Renders a value for display, truncating it to `max_len` characters.
///
/// Containers are summarised by size rather than printed.
///
/// ```
/// # use configdiff_core::{report::display_value, Node};
/// let node = Node::from_json_str(r#"{"a":1,"b":2}"#).unwrap();
/// assert_eq!(display_value(Some(&node), 80), "{...} (2 keys)");
/// assert_eq!(display_value(Some(&Node::String("abcdefgh".into())), 6), "\"ab...");
/// ```
#[must_use]
pub fn display_value(node: Option<&Node>, max_len: usize) -> String {
    let rendered = match node {
        None => "<none>".to_string(),
        Some(Node::Null) => "null".to_string(),
        Some(Node::Bool(flag)) => flag.to_string(),
        Some(Node::Number(number)) => number.to_string(),
        Some(Node::String(text)) => format!("{text:?}"),
        Some(Node::Object(map)) => format!("{{...}} ({} keys)", map.len()),
        Some(Node::Array(items)) => format!("[...] ({} items)", items.len()),
    };
    truncate(rendered, max_len)
}

fn truncate(value: String, max_len: usize) -> String {
    if max_len == 0 || value.chars().count() <= max_len {
        return value;
    }
    let mut truncated: String = value.chars().take(max_len.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
