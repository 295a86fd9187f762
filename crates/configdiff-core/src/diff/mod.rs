//! The comparison engine.
//!
//! [`compare`] walks two documents depth-first and produces an ordered list of
//! [`Change`] records. Traversal uses an explicit worklist, so deeply nested
//! configurations do not grow the call stack. Objects are compared member by
//! member, arrays are reconciled either by position or, when a key field is
//! configured for their path, by identity.

mod list;
mod object;
mod path;
mod primitives;

pub use list::reconcile;
pub use path::{is_ignored, Path, PathSegment};
pub use primitives::equal_scalars;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, trace};

use crate::{DiffOptions, Node};

/// The category of a detected difference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A value exists only in the new document.
    Add,
    /// A value exists only in the old document.
    Remove,
    /// A value differs between the documents.
    Modify,
    /// A keyed array element changed position.
    Move,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Modify => "modify",
            Self::Move => "move",
        };
        f.write_str(name)
    }
}

/// Positional information for changes to keyed array elements.
///
/// ```
/// # use configdiff_core::diff::{Path, Placement};
/// let placement = Placement::moved(Path::new().key("items"), 0, 1);
/// assert_eq!(placement.old_index, Some(0));
/// assert_eq!(placement.target().unwrap().to_string(), "/items[1]");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Path of the array holding the element.
    pub array: Path,
    /// Index of the element in the old array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_index: Option<usize>,
    /// Index of the element in the new array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_index: Option<usize>,
}

impl Placement {
    /// Placement of an element that only exists in the old array.
    #[must_use]
    pub fn removed(array: Path, old_index: usize) -> Self {
        Self { array, old_index: Some(old_index), new_index: None }
    }

    /// Placement of an element that only exists in the new array.
    #[must_use]
    pub fn added(array: Path, new_index: usize) -> Self {
        Self { array, old_index: None, new_index: Some(new_index) }
    }

    /// Placement of an element present in both arrays.
    #[must_use]
    pub fn moved(array: Path, old_index: usize, new_index: usize) -> Self {
        Self { array, old_index: Some(old_index), new_index: Some(new_index) }
    }

    /// Index-addressed location of the element in the new array.
    #[must_use]
    pub fn target(&self) -> Option<Path> {
        self.new_index.map(|index| self.array.index(index))
    }
}

/// One detected difference between two documents.
///
/// `Add` carries only a new value, `Remove` only an old value, `Modify` and
/// `Move` carry both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    /// The kind of difference.
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Canonical path the difference occurred at.
    pub path: Path,
    /// Value in the old document.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Node>,
    /// Value in the new document.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Node>,
    /// Array positions, for changes to keyed array elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
}

impl Change {
    /// Creates an addition.
    #[must_use]
    pub fn add(path: Path, value: Node) -> Self {
        Self { kind: ChangeKind::Add, path, old_value: None, new_value: Some(value), placement: None }
    }

    /// Creates a removal.
    #[must_use]
    pub fn remove(path: Path, value: Node) -> Self {
        Self {
            kind: ChangeKind::Remove,
            path,
            old_value: Some(value),
            new_value: None,
            placement: None,
        }
    }

    /// Creates a modification.
    #[must_use]
    pub fn modify(path: Path, old: Node, new: Node) -> Self {
        Self {
            kind: ChangeKind::Modify,
            path,
            old_value: Some(old),
            new_value: Some(new),
            placement: None,
        }
    }

    /// Creates a move of a keyed array element.
    #[must_use]
    pub fn moved(path: Path, old: Node, new: Node, placement: Placement) -> Self {
        Self {
            kind: ChangeKind::Move,
            path,
            old_value: Some(old),
            new_value: Some(new),
            placement: Some(placement),
        }
    }

    /// Attaches array positions to the change.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }
}

// A present `null` is `Some(Node::Null)`, not `None`.
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Node>, D::Error>
where
    D: Deserializer<'de>,
{
    Node::deserialize(deserializer).map(Some)
}

/// Computes the ordered list of changes that turn `old` into `new`.
///
/// The result is in depth-first traversal order, or sorted by canonical path
/// when [`DiffOptions::stable_order`] is set.
///
/// ```
/// # use configdiff_core::{diff::{compare, ChangeKind}, DiffOptions, Node};
/// let old = Node::from_json_str(r#"{"a":1,"status":{"x":1}}"#).unwrap();
/// let new = Node::from_json_str(r#"{"a":2,"status":{"x":2}}"#).unwrap();
/// let opts = DiffOptions::default().with_ignore_paths(["/status/*"]).unwrap();
/// let changes = compare(&old, &new, &opts);
/// assert_eq!(changes.len(), 1);
/// assert_eq!(changes[0].kind, ChangeKind::Modify);
/// assert_eq!(changes[0].path.to_string(), "/a");
/// ```
#[must_use]
pub fn compare(old: &Node, new: &Node, options: &DiffOptions) -> Vec<Change> {
    let mut changes =
        Worklist::new(options).run(vec![Task::Compare { old, new, path: Path::new() }]);
    if options.stable_order() {
        sort_changes(&mut changes);
    }
    debug!(changes = changes.len(), stable = options.stable_order(), "comparison finished");
    changes
}

/// Sorts changes by canonical path, then by kind.
pub fn sort_changes(changes: &mut [Change]) {
    changes.sort_by(|a, b| a.path.cmp(&b.path).then(a.kind.cmp(&b.kind)));
}

pub(crate) enum Task<'a> {
    Compare {
        old: &'a Node,
        new: &'a Node,
        path: Path,
    },
    Members {
        old: &'a BTreeMap<String, Node>,
        new: &'a BTreeMap<String, Node>,
        path: Path,
        skip: Option<&'a str>,
    },
    Emit(Change),
}

pub(crate) struct Worklist<'a> {
    options: &'a DiffOptions,
    pending: Vec<Task<'a>>,
    changes: Vec<Change>,
}

impl<'a> Worklist<'a> {
    pub(crate) fn new(options: &'a DiffOptions) -> Self {
        Self { options, pending: Vec::new(), changes: Vec::new() }
    }

    pub(crate) fn run(mut self, seed: Vec<Task<'a>>) -> Vec<Change> {
        self.schedule(seed);
        while let Some(task) = self.pending.pop() {
            match task {
                Task::Emit(change) => self.changes.push(change),
                Task::Compare { old, new, path } => self.compare(old, new, path),
                Task::Members { old, new, path, skip } => {
                    let tasks = object::diff_members(old, new, &path, skip, self.options);
                    self.schedule(tasks);
                }
            }
        }
        self.changes
    }

    // Tasks run in the order given.
    fn schedule(&mut self, tasks: Vec<Task<'a>>) {
        self.pending.extend(tasks.into_iter().rev());
    }

    fn compare(&mut self, old: &'a Node, new: &'a Node, path: Path) {
        if skipped(self.options, &path) {
            return;
        }
        match (old, new) {
            (Node::Object(left), Node::Object(right)) => {
                self.schedule(vec![Task::Members { old: left, new: right, path, skip: None }]);
            }
            (Node::Array(left), Node::Array(right)) => {
                let tasks = list::diff_arrays(left, right, &path, self.options);
                self.schedule(tasks);
            }
            (left, right) if left.is_scalar() && right.is_scalar() => {
                if !equal_scalars(left, right, self.options.coercions()) {
                    self.changes.push(Change::modify(path, left.clone(), right.clone()));
                }
            }
            (left, right) => {
                self.changes.push(Change::modify(path, left.clone(), right.clone()));
            }
        }
    }
}

// Rendering the path is skipped entirely when no patterns are configured.
pub(crate) fn skipped(options: &DiffOptions, path: &Path) -> bool {
    if options.ignore_paths().is_empty() || !options.ignores(&path.to_string()) {
        return false;
    }
    trace!(%path, "skipping ignored path");
    true
}
