//! Semantic diffs for hierarchical configuration documents.
//!
//! `configdiff-core` normalizes JSON, YAML, TOML and HCL documents into a common
//! [`Node`] tree and compares two trees structurally. Differences come back
//! as an ordered list of [`Change`] records, which can be projected into an
//! apply-style [`Patch`] or rendered as a human-readable report.
//!
//! Comparison is tuned through [`DiffOptions`]: paths can be ignored, arrays
//! can be matched by a key field instead of by position, and strings can be
//! allowed to equal numbers or booleans.
//!
//! ```
//! use configdiff_core::{diff_yaml, DiffOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let old = "spec:\n  containers:\n    - name: web\n      image: nginx:1.25\n    - name: sidecar\n      image: envoy\n";
//!     let new = "spec:\n  containers:\n    - name: sidecar\n      image: envoy\n    - name: web\n      image: nginx:1.27\n";
//!     let opts = DiffOptions::default().with_array_key("/spec/containers", "name")?;
//!     let result = diff_yaml(old.as_bytes(), new.as_bytes(), &opts)?;
//!
//!     let paths: Vec<String> = result.changes.iter().map(|c| c.path.to_string()).collect();
//!     assert!(paths.contains(&"/spec/containers[name=web]/image".to_string()));
//!     assert!(result.report.contains("~ /spec/containers[name=web]/image: \"nginx:1.25\" → \"nginx:1.27\""));
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diff;
mod error;
mod format;
mod node;
mod number;
mod options;
mod patch;
pub mod report;

pub use diff::{compare, Change, ChangeKind, Path, PathSegment, Placement};
pub use error::{Error, OptionsError, ParseError, PathParseError};
pub use format::Format;
pub use node::{Node, NodeKind};
pub use number::Number;
pub use options::{Coercions, DiffOptions};
pub use patch::{OpKind, Operation, Patch, PatchError};

use report::ReportOptions;

/// Everything produced by one document comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffResult {
    /// Detected changes.
    pub changes: Vec<Change>,
    /// Apply-style projection of `changes`.
    pub patch: Patch,
    /// Detailed human-readable report of `changes`.
    pub report: String,
}

impl DiffResult {
    /// Builds the result for already computed changes.
    #[must_use]
    pub fn from_changes(changes: Vec<Change>) -> Self {
        let patch = Patch::from_changes(&changes);
        let report = report::render(&changes, &ReportOptions::detailed());
        Self { changes, patch, report }
    }

    /// Indicates whether the documents differ.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Parses and compares two documents.
///
/// ```
/// # use configdiff_core::{diff_documents, DiffOptions, Format};
/// let result = diff_documents(
///     b"port = 8080\n",
///     Format::Toml,
///     br#"{"port": "8080"}"#,
///     Format::Json,
///     &DiffOptions::default(),
/// )?;
/// assert_eq!(result.changes.len(), 1);
/// # Ok::<(), configdiff_core::Error>(())
/// ```
pub fn diff_documents(
    old: &[u8],
    old_format: Format,
    new: &[u8],
    new_format: Format,
    options: &DiffOptions,
) -> Result<DiffResult, Error> {
    let old = old_format.parse(old).map_err(|source| Error::Parse { format: old_format, source })?;
    let new = new_format.parse(new).map_err(|source| Error::Parse { format: new_format, source })?;
    Ok(diff_trees(&old, &new, options))
}

/// Compares two already parsed documents.
#[must_use]
pub fn diff_trees(old: &Node, new: &Node, options: &DiffOptions) -> DiffResult {
    DiffResult::from_changes(compare(old, new, options))
}

/// Compares two JSON documents.
pub fn diff_json(old: &[u8], new: &[u8], options: &DiffOptions) -> Result<DiffResult, Error> {
    diff_documents(old, Format::Json, new, Format::Json, options)
}

/// Compares two YAML documents.
pub fn diff_yaml(old: &[u8], new: &[u8], options: &DiffOptions) -> Result<DiffResult, Error> {
    diff_documents(old, Format::Yaml, new, Format::Yaml, options)
}

/// Returns the semantic version of the `configdiff-core` crate.
///
/// ```
/// assert!(!configdiff_core::version().is_empty());
/// ```
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
