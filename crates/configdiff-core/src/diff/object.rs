use std::collections::{BTreeMap, BTreeSet};

use super::{skipped, Change, Path, Task};
use crate::{DiffOptions, Node};

/// Schedules the member-wise comparison of two objects.
///
/// Keys are visited in sorted order over the union of both key sets. `skip`
/// names a member that is excluded from comparison, used for the key field of
/// set-matched array elements.
pub(super) fn diff_members<'a>(
    old: &'a BTreeMap<String, Node>,
    new: &'a BTreeMap<String, Node>,
    path: &Path,
    skip: Option<&str>,
    options: &DiffOptions,
) -> Vec<Task<'a>> {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let mut tasks = Vec::with_capacity(keys.len());
    for key in keys {
        if skip == Some(key.as_str()) {
            continue;
        }
        let member = path.key(key);
        match (old.get(key), new.get(key)) {
            (Some(old), Some(new)) => tasks.push(Task::Compare { old, new, path: member }),
            (Some(old), None) if !skipped(options, &member) => {
                tasks.push(Task::Emit(Change::remove(member, old.clone())));
            }
            (None, Some(new)) if !skipped(options, &member) => {
                tasks.push(Task::Emit(Change::add(member, new.clone())));
            }
            _ => {}
        }
    }
    tasks
}
