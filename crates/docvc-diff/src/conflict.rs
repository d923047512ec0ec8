//! Three-way conflict detection and overlay.
//!
//! Both sides are compared leaf by leaf against their common ancestor. Two
//! sides conflict at a path when
//!
//! - both changed the same leaf to different results, or
//! - one side wrote a leaf at a path where the other side wrote content
//!   beneath it (a field replaced by a scalar on one side and extended on
//!   the other). The conflict is reported at the shorter path.
//!
//! Identical edits on both sides and edits on only one side never conflict.
//!
//! Emptying a container that had children is not a write at the
//! container's path: it is the deletion of each child, so the other side
//! may still add children beside them.

use std::collections::{BTreeMap, BTreeSet};

use docvc_types::{PathSegment, Value, ValuePath};

use crate::leaves::{changed_leaves, flatten, flatten_into, unflatten};

type LeafChanges = BTreeMap<ValuePath, Option<Value>>;

/// One side's leaf changes since the common ancestor.
struct SideChanges {
    leaves: LeafChanges,
    /// Containers emptied on this side, with the empty value they became.
    emptied: Vec<(ValuePath, Value)>,
}

fn side_changes(base: Option<&Value>, side: &Value) -> SideChanges {
    let base_leaves = base.map(flatten).unwrap_or_default();
    let mut leaves = changed_leaves(&base_leaves, &flatten(side));
    let emptied: Vec<(ValuePath, Value)> = leaves
        .iter()
        .filter_map(|(path, value)| match value {
            Some(value) if was_emptied(&base_leaves, path, value) => {
                Some((path.clone(), value.clone()))
            }
            _ => None,
        })
        .collect();
    for (path, _) in &emptied {
        leaves.remove(path);
    }
    SideChanges { leaves, emptied }
}

/// Returns `true` if `value` is an empty container standing where `base`
/// had a container of the same kind with children.
fn was_emptied(base: &BTreeMap<ValuePath, Value>, path: &ValuePath, value: &Value) -> bool {
    let indexed = match value {
        Value::Map(m) if m.is_empty() => false,
        Value::Sequence(s) if s.is_empty() => true,
        _ => return false,
    };
    base.keys().any(|leaf| {
        leaf.len() > path.len()
            && leaf.starts_with(path)
            && matches!(leaf.segments()[path.len()], PathSegment::Index(_)) == indexed
    })
}

fn find_conflicts(a: &LeafChanges, b: &LeafChanges) -> BTreeSet<ValuePath> {
    let mut conflicts = BTreeSet::new();

    for (path, a_value) in a {
        if let Some(b_value) = b.get(path) {
            if a_value != b_value {
                conflicts.insert(path.clone());
            }
        }
    }

    let written = |changes: &LeafChanges| -> Vec<ValuePath> {
        changes
            .iter()
            .filter(|(_, value)| value.is_some())
            .map(|(path, _)| path.clone())
            .collect()
    };
    let a_written = written(a);
    let b_written = written(b);
    for a_path in &a_written {
        for b_path in &b_written {
            if a_path == b_path {
                continue;
            }
            if b_path.starts_with(a_path) {
                conflicts.insert(a_path.clone());
            } else if a_path.starts_with(b_path) {
                conflicts.insert(b_path.clone());
            }
        }
    }

    conflicts
}

/// Paths where `a` and `b` changed the same content incompatibly since
/// `base`. With no common ancestor every leaf of either side counts as a
/// change.
pub fn conflicting_paths(base: Option<&Value>, a: &Value, b: &Value) -> Vec<ValuePath> {
    find_conflicts(&side_changes(base, a).leaves, &side_changes(base, b).leaves)
        .into_iter()
        .collect()
}

/// Overlay `source`'s changes since `base` onto `target`.
///
/// Source changes that fall on or beneath a conflicting path are skipped,
/// so the target's value stands there unless `overrides` supplies one.
/// Each override replaces everything at and beneath its path; `None`
/// removes the path.
pub fn three_way_merge(
    base: Option<&Value>,
    source: &Value,
    target: &Value,
    overrides: &BTreeMap<ValuePath, Option<Value>>,
) -> Value {
    let source_changes = side_changes(base, source);
    let target_changes = side_changes(base, target);
    let conflicts = find_conflicts(&source_changes.leaves, &target_changes.leaves);
    let in_conflict = |path: &ValuePath| conflicts.iter().any(|conflict| path.starts_with(conflict));

    let mut leaves = flatten(target);

    for (path, value) in source_changes.leaves {
        if in_conflict(&path) {
            continue;
        }
        match value {
            Some(value) => {
                leaves.insert(path, value);
            }
            None => {
                leaves.remove(&path);
            }
        }
    }

    // A container the source emptied survives as empty once nothing is
    // left beneath it.
    for (path, empty) in source_changes.emptied {
        if !in_conflict(&path) && !leaves.keys().any(|leaf| leaf.starts_with(&path)) {
            leaves.insert(path, empty);
        }
    }

    for (path, value) in overrides {
        leaves.retain(|leaf, _| !leaf.starts_with(path));
        if let Some(value) = value {
            flatten_into(path.clone(), value, &mut leaves);
        }
    }

    unflatten(&leaves)
}
