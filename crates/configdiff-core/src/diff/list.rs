use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use super::{skipped, Change, Path, Placement, Task, Worklist};
use crate::{DiffOptions, Node, NodeKind};

/// Reconciles two arrays found at `path`, returning the changes between them.
///
/// Arrays are compared element by element unless a key field is configured
/// for `path`. In that case elements are matched by the value of that field
/// regardless of position, and matched elements that changed position are
/// reported as moves.
///
/// ```
/// # use configdiff_core::{diff::{reconcile, ChangeKind, Path}, DiffOptions, Node};
/// let Node::Array(old) = Node::from_json_str(r#"[{"id":1},{"id":2}]"#).unwrap() else { unreachable!() };
/// let Node::Array(new) = Node::from_json_str(r#"[{"id":2},{"id":1}]"#).unwrap() else { unreachable!() };
/// let opts = DiffOptions::default().with_array_key("/", "id").unwrap();
/// let changes = reconcile(&old, &new, &Path::new(), &opts);
/// assert!(changes.iter().all(|change| change.kind == ChangeKind::Move));
/// assert_eq!(changes[0].path.to_string(), "/[id=1]");
/// ```
#[must_use]
pub fn reconcile(old: &[Node], new: &[Node], path: &Path, options: &DiffOptions) -> Vec<Change> {
    let tasks = diff_arrays(old, new, path, options);
    Worklist::new(options).run(tasks)
}

/// The value of an element's key field. Values of different kinds never match.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Identity {
    kind: NodeKind,
    text: String,
}

impl Identity {
    fn of(value: &Node) -> Option<Self> {
        value.scalar_text().map(|text| Self { kind: value.kind(), text })
    }
}

pub(super) fn diff_arrays<'a>(
    old: &'a [Node],
    new: &'a [Node],
    path: &Path,
    options: &'a DiffOptions,
) -> Vec<Task<'a>> {
    if let Some(field) = key_field(path, options) {
        match (identify(old, field), identify(new, field)) {
            (Ok(old_ids), Ok(new_ids)) => {
                debug!(%path, field, "matching array elements by key");
                return by_identity(old, new, &old_ids, &new_ids, path, field, options);
            }
            (Err(reason), _) | (_, Err(reason)) => {
                warn!(%path, field, reason, "falling back to positional array comparison");
            }
        }
    }
    by_position(old, new, path, options)
}

fn key_field<'a>(path: &Path, options: &'a DiffOptions) -> Option<&'a str> {
    if options.array_set_keys().is_empty() {
        return None;
    }
    options.array_key(&path.to_string())
}

// Identities must be unique by their rendered text, since `[field=value]`
// selectors cannot tell `1` from `"1"`.
fn identify(items: &[Node], field: &str) -> Result<Vec<Identity>, &'static str> {
    let mut seen = BTreeSet::new();
    let mut identities = Vec::with_capacity(items.len());
    for item in items {
        let Node::Object(map) = item else {
            return Err("element is not an object");
        };
        let value = map.get(field).ok_or("element is missing the key field")?;
        let identity = Identity::of(value).ok_or("key field is not a scalar")?;
        if !seen.insert(identity.text.clone()) {
            return Err("duplicate key value");
        }
        identities.push(identity);
    }
    Ok(identities)
}

fn by_position<'a>(
    old: &'a [Node],
    new: &'a [Node],
    path: &Path,
    options: &DiffOptions,
) -> Vec<Task<'a>> {
    let len = old.len().max(new.len());
    let mut tasks = Vec::with_capacity(len);
    for index in 0..len {
        let element = path.index(index);
        match (old.get(index), new.get(index)) {
            (Some(old), Some(new)) => tasks.push(Task::Compare { old, new, path: element }),
            (Some(old), None) if !skipped(options, &element) => {
                tasks.push(Task::Emit(Change::remove(element, old.clone())));
            }
            (None, Some(new)) if !skipped(options, &element) => {
                tasks.push(Task::Emit(Change::add(element, new.clone())));
            }
            _ => {}
        }
    }
    tasks
}

// Old elements are visited in old order, then new-only elements in new order.
fn by_identity<'a>(
    old: &'a [Node],
    new: &'a [Node],
    old_ids: &[Identity],
    new_ids: &[Identity],
    path: &Path,
    field: &'a str,
    options: &DiffOptions,
) -> Vec<Task<'a>> {
    let positions: BTreeMap<&Identity, usize> =
        new_ids.iter().enumerate().map(|(index, identity)| (identity, index)).collect();
    let mut tasks = Vec::new();

    for (old_index, (item, identity)) in old.iter().zip(old_ids).enumerate() {
        let element = path.identity(field, &identity.text);
        if skipped(options, &element) {
            continue;
        }
        let Some(&new_index) = positions.get(identity) else {
            let placement = Placement::removed(path.clone(), old_index);
            tasks.push(Task::Emit(Change::remove(element, item.clone()).with_placement(placement)));
            continue;
        };
        let counterpart = &new[new_index];
        if old_index != new_index {
            let placement = Placement::moved(path.clone(), old_index, new_index);
            tasks.push(Task::Emit(Change::moved(
                element.clone(),
                item.clone(),
                counterpart.clone(),
                placement,
            )));
        }
        if let (Node::Object(old_members), Node::Object(new_members)) = (item, counterpart) {
            tasks.push(Task::Members {
                old: old_members,
                new: new_members,
                path: element,
                skip: Some(field),
            });
        }
    }

    let known: BTreeSet<&Identity> = old_ids.iter().collect();
    for (new_index, (item, identity)) in new.iter().zip(new_ids).enumerate() {
        if known.contains(identity) {
            continue;
        }
        let element = path.identity(field, &identity.text);
        if skipped(options, &element) {
            continue;
        }
        let placement = Placement::added(path.clone(), new_index);
        tasks.push(Task::Emit(Change::add(element, item.clone()).with_placement(placement)));
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{compare, ChangeKind};

    fn node(json: &str) -> Node {
        Node::from_json_str(json).unwrap()
    }

    fn keyed(path: &str, field: &str) -> DiffOptions {
        DiffOptions::default().with_array_key(path, field).unwrap()
    }

    fn summary(changes: &[Change]) -> Vec<(ChangeKind, String)> {
        changes.iter().map(|c| (c.kind, c.path.to_string())).collect()
    }

    #[test]
    fn positional_changes_are_index_addressed() {
        let old = node(r#"{"ports":[80,443,8080]}"#);
        let new = node(r#"{"ports":[80,8443]}"#);
        let changes = compare(&old, &new, &DiffOptions::default());
        assert_eq!(
            summary(&changes),
            [(ChangeKind::Modify, "/ports[1]".to_string()), (ChangeKind::Remove, "/ports[2]".to_string())]
        );
    }

    #[test]
    fn positional_growth_is_reported_as_adds() {
        let changes = compare(&node("[1]"), &node("[1,2,3]"), &DiffOptions::default());
        assert_eq!(
            changes,
            vec![Change::add(Path::new().index(1), node("2")), Change::add(Path::new().index(2), node("3"))]
        );
    }

    #[test]
    fn reordering_without_key_is_positional() {
        let old = node(r#"{"items":[{"id":1,"v":"a"},{"id":2,"v":"b"}]}"#);
        let new = node(r#"{"items":[{"id":2,"v":"b"},{"id":1,"v":"a"}]}"#);
        let changes = compare(&old, &new, &DiffOptions::default());
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Modify));
        assert!(changes.iter().any(|c| c.path.to_string() == "/items[0]/id"));
    }

    #[test]
    fn reordering_with_key_is_a_move() {
        let old = node(r#"{"items":[{"id":1,"v":"a"},{"id":2,"v":"b"}]}"#);
        let new = node(r#"{"items":[{"id":2,"v":"b"},{"id":1,"v":"a"}]}"#);
        let changes = compare(&old, &new, &keyed("/items", "id"));
        assert_eq!(
            summary(&changes),
            [(ChangeKind::Move, "/items[id=1]".to_string()), (ChangeKind::Move, "/items[id=2]".to_string())]
        );
        let placement = changes[0].placement.as_ref().unwrap();
        assert_eq!((placement.old_index, placement.new_index), (Some(0), Some(1)));
    }

    #[test]
    fn keyed_elements_report_content_changes_under_identity_path() {
        let old = node(r#"{"containers":[{"name":"web","image":"nginx:1"},{"name":"db","image":"pg"}]}"#);
        let new = node(r#"{"containers":[{"name":"web","image":"nginx:2"},{"name":"cache","image":"redis"}]}"#);
        let changes = compare(&old, &new, &keyed("/containers", "name"));
        assert_eq!(
            summary(&changes),
            [
                (ChangeKind::Modify, "/containers[name=web]/image".to_string()),
                (ChangeKind::Remove, "/containers[name=db]".to_string()),
                (ChangeKind::Add, "/containers[name=cache]".to_string()),
            ]
        );
        assert_eq!(changes[1].placement, Some(Placement::removed(Path::new().key("containers"), 1)));
        assert_eq!(changes[2].placement, Some(Placement::added(Path::new().key("containers"), 1)));
    }

    #[test]
    fn move_precedes_content_changes() {
        let old = node(r#"[{"id":"a","v":1},{"id":"b","v":1}]"#);
        let new = node(r#"[{"id":"b","v":1},{"id":"a","v":2}]"#);
        let changes = compare(&old, &new, &keyed("/", "id"));
        assert_eq!(
            summary(&changes),
            [
                (ChangeKind::Move, "/[id=a]".to_string()),
                (ChangeKind::Modify, "/[id=a]/v".to_string()),
                (ChangeKind::Move, "/[id=b]".to_string()),
            ]
        );
    }

    #[test]
    fn duplicate_keys_fall_back_to_positional() {
        let old = node(r#"[{"id":1,"v":1},{"id":1,"v":2}]"#);
        let new = node(r#"[{"id":1,"v":2},{"id":1,"v":1}]"#);
        let changes = compare(&old, &new, &keyed("/", "id"));
        assert_eq!(
            summary(&changes),
            [(ChangeKind::Modify, "/[0]/v".to_string()), (ChangeKind::Modify, "/[1]/v".to_string())]
        );
    }

    #[test]
    fn missing_key_field_falls_back_to_positional() {
        let old = node(r#"[{"id":1},{"name":"x"}]"#);
        let new = node(r#"[{"name":"x"},{"id":1}]"#);
        let changes = compare(&old, &new, &keyed("/", "id"));
        assert!(changes.iter().all(|c| c.placement.is_none()));
        assert!(changes.iter().all(|c| c.kind != ChangeKind::Move));
    }

    #[test]
    fn non_object_elements_fall_back_to_positional() {
        let changes = compare(&node("[1,2]"), &node("[2,1]"), &keyed("/", "id"));
        assert_eq!(
            summary(&changes),
            [(ChangeKind::Modify, "/[0]".to_string()), (ChangeKind::Modify, "/[1]".to_string())]
        );
    }

    #[test]
    fn identities_of_different_kinds_do_not_match() {
        let old = node(r#"[{"id":1}]"#);
        let new = node(r#"[{"id":"1"}]"#);
        let changes = compare(&old, &new, &keyed("/", "id"));
        assert_eq!(summary(&changes), [(ChangeKind::Remove, "/[id=1]".to_string()), (ChangeKind::Add, "/[id=1]".to_string())]);
    }

    #[test]
    fn keys_with_the_same_text_fall_back_to_positional() {
        let old = node(r#"{"items":[{"id":1,"v":1},{"id":"1","v":2}]}"#);
        let new = node(r#"{"items":[{"id":1,"v":1},{"id":"1","v":3}]}"#);
        let opts = keyed("/items", "id");
        let changes = compare(&old, &new, &opts);
        assert_eq!(summary(&changes), [(ChangeKind::Modify, "/items[1]/v".to_string())]);

        let patch = crate::Patch::from_changes(&changes);
        assert_eq!(old.apply_patch(&patch).unwrap(), new);
    }

    #[test]
    fn ignored_identity_paths_are_skipped() {
        let old = node(r#"{"items":[{"id":"a","v":1},{"id":"b","v":1}]}"#);
        let new = node(r#"{"items":[{"id":"b","v":2}]}"#);
        let opts = keyed("/items", "id").with_ignore_paths(["/items[id=a]"]).unwrap();
        let changes = compare(&old, &new, &opts);
        assert_eq!(
            summary(&changes),
            [(ChangeKind::Move, "/items[id=b]".to_string()), (ChangeKind::Modify, "/items[id=b]/v".to_string())]
        );
    }

    #[test]
    fn reconcile_matches_compare_for_array_roots() {
        let old = node(r#"[{"id":1},{"id":2}]"#);
        let new = node(r#"[{"id":2},{"id":3}]"#);
        let opts = keyed("/", "id");
        let (Node::Array(left), Node::Array(right)) = (&old, &new) else { unreachable!() };
        assert_eq!(reconcile(left, right, &Path::new(), &opts), compare(&old, &new, &opts));
    }
}
