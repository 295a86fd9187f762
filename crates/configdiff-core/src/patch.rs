//! Patch assembly and application.
//!
//! A [`Patch`] is the apply-oriented projection of a change list. Operations
//! mirror RFC 6902 closely enough for generic tooling: `add` and `replace`
//! carry a value, `move` carries a source path.
//!
//! Application runs in phases so that operations produced from one change
//! list never invalidate each other's paths: replacements first, then
//! removals (deepest and highest index first), then object member additions,
//! and finally per array the placement of index-addressed additions and move
//! targets. Elements that are not placed keep their relative order and fill
//! the remaining slots.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::{
    diff::{Change, ChangeKind, Path, PathSegment},
    Node,
};

/// The kind of a patch operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Insert a value.
    Add,
    /// Delete the value at the path.
    Remove,
    /// Overwrite the value at the path.
    Replace,
    /// Relocate an array element.
    Move,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
            Self::Move => "move",
        };
        f.write_str(name)
    }
}

/// One patch operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation kind.
    pub op: OpKind,
    /// Target location.
    pub path: Path,
    /// Value for `add` and `replace`.
    #[serde(
        default,
        deserialize_with = "crate::diff::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Node>,
    /// Source location for `move`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Path>,
}

impl Operation {
    fn with_value(op: OpKind, path: Path, value: Node) -> Self {
        Self { op, path, value: Some(value), from: None }
    }

    fn value(&self) -> Result<&Node, PatchError> {
        self.value.as_ref().ok_or_else(|| PatchError::MissingValue { op: self.op, path: self.path.clone() })
    }
}

impl From<&Change> for Operation {
    fn from(change: &Change) -> Self {
        let target = change.placement.as_ref().and_then(|placement| placement.target());
        let value = change.new_value.clone().unwrap_or(Node::Null);
        match change.kind {
            ChangeKind::Add => {
                Self::with_value(OpKind::Add, target.unwrap_or_else(|| change.path.clone()), value)
            }
            ChangeKind::Remove => {
                Self { op: OpKind::Remove, path: change.path.clone(), value: None, from: None }
            }
            ChangeKind::Modify => Self::with_value(OpKind::Replace, change.path.clone(), value),
            ChangeKind::Move => Self {
                op: OpKind::Move,
                path: target.unwrap_or_else(|| change.path.clone()),
                value: None,
                from: Some(change.path.clone()),
            },
        }
    }
}

/// An ordered list of operations derived from a change list.
///
/// ```
/// # use configdiff_core::{DiffOptions, Node, Patch};
/// let old = Node::from_json_str(r#"{"replicas":1,"debug":true}"#).unwrap();
/// let new = Node::from_json_str(r#"{"replicas":3}"#).unwrap();
/// let patch = Patch::from_changes(&old.diff(&new, &DiffOptions::default()));
/// let json = serde_json::to_string(&patch).unwrap();
/// assert_eq!(json, r#"[{"op":"remove","path":"/debug"},{"op":"replace","path":"/replicas","value":3}]"#);
/// assert_eq!(old.apply_patch(&patch).unwrap(), new);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    operations: Vec<Operation>,
}

impl Patch {
    /// Converts changes into operations, preserving their order.
    ///
    /// Additions and moves of keyed array elements target the element's index
    /// in the new array. Content changes of a moved element are carried by
    /// separate `replace` operations.
    #[must_use]
    pub fn from_changes(changes: &[Change]) -> Self {
        Self { operations: changes.iter().map(Operation::from).collect() }
    }

    /// Returns the operations.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Indicates whether the patch has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Iterates over the operations.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }
}

impl From<Vec<Operation>> for Patch {
    fn from(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

/// Errors that can occur while applying a patch.
///
/// ```
/// # use configdiff_core::{Node, Patch};
/// let patch: Patch = serde_json::from_str(r#"[{"op":"remove","path":"/missing"}]"#).unwrap();
/// let err = Node::from_json_str("{}").unwrap().apply_patch(&patch).unwrap_err();
/// assert_eq!(err.to_string(), "remove target /missing does not exist");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The operation's path does not resolve in the document.
    #[error("{op} target {path} does not exist")]
    MissingTarget {
        /// Operation kind.
        op: OpKind,
        /// Unresolved path.
        path: Path,
    },
    /// An `add` or `replace` operation had no value.
    #[error("{op} at {path} requires a value")]
    MissingValue {
        /// Operation kind.
        op: OpKind,
        /// Target path.
        path: Path,
    },
    /// The operation cannot be applied at its path.
    #[error("cannot {op} at {path}: {reason}")]
    InvalidTarget {
        /// Operation kind.
        op: OpKind,
        /// Target path.
        path: Path,
        /// Why the target was rejected.
        reason: &'static str,
    },
    /// An index-addressed placement does not fit the resulting array.
    #[error("index {index} is out of bounds for {array} with {len} elements")]
    IndexOutOfBounds {
        /// Path of the array.
        array: Path,
        /// Requested index.
        index: usize,
        /// Length of the resulting array.
        len: usize,
    },
}

enum Source {
    Value(Node),
    Moved(PathSegment),
}

struct Placed {
    index: usize,
    source: Source,
    op: OpKind,
}

pub(crate) fn apply_patch(node: &Node, patch: &Patch) -> Result<Node, PatchError> {
    let mut document = node.clone();
    let mut removals = Vec::new();
    let mut member_adds = Vec::new();
    let mut placements: BTreeMap<Path, Vec<Placed>> = BTreeMap::new();

    for operation in patch {
        match operation.op {
            OpKind::Replace => {
                let value = operation.value()?.clone();
                let slot = document.get_mut(&operation.path).ok_or_else(|| missing(operation))?;
                *slot = value;
            }
            OpKind::Remove => removals.push(&operation.path),
            OpKind::Add => {
                let value = operation.value()?.clone();
                match operation.path.last() {
                    Some(PathSegment::Index(index)) => {
                        let array = parent(operation)?;
                        placements.entry(array).or_default().push(Placed {
                            index: *index,
                            source: Source::Value(value),
                            op: OpKind::Add,
                        });
                    }
                    Some(PathSegment::Identity { .. }) => {
                        return Err(invalid(operation, "keyed additions must target an index"));
                    }
                    _ => member_adds.push((&operation.path, value)),
                }
            }
            OpKind::Move => {
                let from = operation.from.as_ref().ok_or_else(|| {
                    invalid(operation, "move operations require a source path")
                })?;
                let (Some(PathSegment::Index(index)), Some(segment)) =
                    (operation.path.last(), from.last())
                else {
                    return Err(invalid(operation, "move target must be an array index"));
                };
                let array = parent(operation)?;
                if from.parent().as_ref() != Some(&array) {
                    return Err(invalid(operation, "elements can only move within one array"));
                }
                placements.entry(array).or_default().push(Placed {
                    index: *index,
                    source: Source::Moved(segment.clone()),
                    op: OpKind::Move,
                });
            }
        }
    }

    removals.sort_by(|a, b| b.cmp(a));
    for path in removals {
        remove(&mut document, path)?;
    }

    for (path, value) in member_adds {
        insert_member(&mut document, path, value)?;
    }

    let mut arrays: Vec<(Path, Vec<Placed>)> = placements.into_iter().collect();
    arrays.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    for (array, placed) in arrays {
        place(&mut document, &array, placed)?;
    }

    Ok(document)
}

fn missing(operation: &Operation) -> PatchError {
    PatchError::MissingTarget { op: operation.op, path: operation.path.clone() }
}

fn invalid(operation: &Operation, reason: &'static str) -> PatchError {
    PatchError::InvalidTarget { op: operation.op, path: operation.path.clone(), reason }
}

fn parent(operation: &Operation) -> Result<Path, PatchError> {
    operation.path.parent().ok_or_else(|| invalid(operation, "the document root has no parent"))
}

fn remove(document: &mut Node, path: &Path) -> Result<(), PatchError> {
    let missing = || PatchError::MissingTarget { op: OpKind::Remove, path: path.clone() };
    let (Some(container), Some(last)) = (path.parent(), path.last()) else {
        return Err(PatchError::InvalidTarget {
            op: OpKind::Remove,
            path: path.clone(),
            reason: "the document root cannot be removed",
        });
    };
    trace!(%path, "removing");
    match (document.get_mut(&container), last) {
        (Some(Node::Object(map)), PathSegment::Key(key)) => {
            map.remove(key).map(drop).ok_or_else(missing)
        }
        (Some(Node::Array(items)), PathSegment::Index(index)) if *index < items.len() => {
            items.remove(*index);
            Ok(())
        }
        (Some(Node::Array(items)), PathSegment::Identity { field, value }) => {
            let position =
                items.iter().position(|item| item.has_identity(field, value)).ok_or_else(missing)?;
            items.remove(position);
            Ok(())
        }
        _ => Err(missing()),
    }
}

fn insert_member(document: &mut Node, path: &Path, value: Node) -> Result<(), PatchError> {
    let Some(PathSegment::Key(key)) = path.last() else {
        *document = value;
        return Ok(());
    };
    let container = path.parent().unwrap_or_default();
    match document.get_mut(&container) {
        Some(Node::Object(map)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        _ => Err(PatchError::MissingTarget { op: OpKind::Add, path: path.clone() }),
    }
}

fn place(document: &mut Node, array: &Path, placed: Vec<Placed>) -> Result<(), PatchError> {
    let Some(Node::Array(items)) = document.get_mut(array) else {
        let op = placed.first().map_or(OpKind::Add, |entry| entry.op);
        return Err(PatchError::MissingTarget { op, path: array.clone() });
    };

    let mut slots = BTreeMap::new();
    for entry in placed {
        let node = match entry.source {
            Source::Value(node) => node,
            Source::Moved(segment) => take(items, &segment).ok_or_else(|| {
                PatchError::MissingTarget { op: OpKind::Move, path: array.clone().with_segment(segment) }
            })?,
        };
        if slots.insert(entry.index, node).is_some() {
            return Err(PatchError::InvalidTarget {
                op: entry.op,
                path: array.index(entry.index),
                reason: "index is targeted more than once",
            });
        }
    }

    let len = items.len() + slots.len();
    if let Some((&index, _)) = slots.last_key_value() {
        if index >= len {
            return Err(PatchError::IndexOutOfBounds { array: array.clone(), index, len });
        }
    }

    let mut remaining = std::mem::take(items).into_iter();
    for index in 0..len {
        match slots.remove(&index) {
            Some(node) => items.push(node),
            None => items.extend(remaining.next()),
        }
    }
    Ok(())
}

fn take(items: &mut Vec<Node>, segment: &PathSegment) -> Option<Node> {
    let position = match segment {
        PathSegment::Identity { field, value } => {
            items.iter().position(|item| item.has_identity(field, value))?
        }
        PathSegment::Index(index) if *index < items.len() => *index,
        _ => return None,
    };
    Some(items.remove(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiffOptions;

    fn node(json: &str) -> Node {
        Node::from_json_str(json).unwrap()
    }

    fn patch(json: &str) -> Patch {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn changes_map_to_operations() {
        let changes = vec![
            Change::add(Path::new().key("a"), node("1")),
            Change::remove(Path::new().key("b"), node("2")),
            Change::modify(Path::new().key("c"), node("3"), node("4")),
        ];
        let ops: Vec<(OpKind, String)> = Patch::from_changes(&changes)
            .iter()
            .map(|op| (op.op, op.path.to_string()))
            .collect();
        assert_eq!(
            ops,
            [
                (OpKind::Add, "/a".to_string()),
                (OpKind::Remove, "/b".to_string()),
                (OpKind::Replace, "/c".to_string()),
            ]
        );
    }

    #[test]
    fn keyed_changes_target_new_indices() {
        let old = node(r#"{"items":[{"id":1,"v":"a"},{"id":2,"v":"b"}]}"#);
        let new = node(r#"{"items":[{"id":3},{"id":2,"v":"b"},{"id":1,"v":"z"}]}"#);
        let opts = DiffOptions::default().with_array_key("/items", "id").unwrap();
        let patch = Patch::from_changes(&old.diff(&new, &opts));
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"op": "move", "path": "/items[2]", "from": "/items[id=1]"},
                {"op": "replace", "path": "/items[id=1]/v", "value": "z"},
                {"op": "add", "path": "/items[0]", "value": {"id": 3}},
            ])
        );
        assert_eq!(old.apply_patch(&patch).unwrap(), new);
    }

    #[test]
    fn null_values_are_kept_when_deserialized() {
        let patch = patch(r#"[{"op":"add","path":"/a","value":null}]"#);
        assert_eq!(patch.operations()[0].value, Some(Node::Null));
        assert_eq!(node("{}").apply_patch(&patch).unwrap(), node(r#"{"a":null}"#));
    }

    #[test]
    fn removals_apply_from_the_highest_index() {
        let patch = patch(r#"[{"op":"remove","path":"/[1]"},{"op":"remove","path":"/[3]"}]"#);
        assert_eq!(node("[0,1,2,3]").apply_patch(&patch).unwrap(), node("[0,2]"));
    }

    #[test]
    fn replace_at_root_swaps_the_document() {
        let patch = patch(r#"[{"op":"replace","path":"/","value":[1]}]"#);
        assert_eq!(node(r#"{"a":1}"#).apply_patch(&patch).unwrap(), node("[1]"));
    }

    #[test]
    fn missing_value_is_rejected() {
        let patch = patch(r#"[{"op":"replace","path":"/a"}]"#);
        let err = node(r#"{"a":1}"#).apply_patch(&patch).unwrap_err();
        assert_eq!(err.to_string(), "replace at /a requires a value");
    }

    #[test]
    fn move_without_source_is_rejected() {
        let patch = patch(r#"[{"op":"move","path":"/[0]"}]"#);
        let err = node("[1]").apply_patch(&patch).unwrap_err();
        assert!(matches!(err, PatchError::InvalidTarget { op: OpKind::Move, .. }));
    }

    #[test]
    fn moves_across_arrays_are_rejected() {
        let patch = patch(r#"[{"op":"move","path":"/a[0]","from":"/b[id=1]"}]"#);
        let err = node(r#"{"a":[],"b":[{"id":1}]}"#).apply_patch(&patch).unwrap_err();
        assert!(matches!(err, PatchError::InvalidTarget { reason, .. } if reason.contains("one array")));
    }

    #[test]
    fn placement_beyond_the_end_is_rejected() {
        let patch = patch(r#"[{"op":"add","path":"/[5]","value":1}]"#);
        let err = node("[0]").apply_patch(&patch).unwrap_err();
        assert_eq!(err, PatchError::IndexOutOfBounds { array: Path::new(), index: 5, len: 2 });
    }

    #[test]
    fn remove_of_unknown_identity_is_rejected() {
        let patch = patch(r#"[{"op":"remove","path":"/items[id=9]"}]"#);
        let err = node(r#"{"items":[{"id":1}]}"#).apply_patch(&patch).unwrap_err();
        assert_eq!(err.to_string(), "remove target /items[id=9] does not exist");
    }

    #[test]
    fn adds_into_missing_objects_are_rejected() {
        let patch = patch(r#"[{"op":"add","path":"/a/b","value":1}]"#);
        let err = node("{}").apply_patch(&patch).unwrap_err();
        assert!(matches!(err, PatchError::MissingTarget { op: OpKind::Add, .. }));
    }
}
