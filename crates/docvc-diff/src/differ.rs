//! Structural diff: compare two document values path by path.
//!
//! Maps are compared key by key, sequences index by index. A path present
//! on only one side is a create or delete; a path whose value differs in
//! kind or scalar content is an update. Afterwards, a deleted map entry and
//! a created map entry carrying the same value are folded into a single
//! rename (same parent) or move (different parent).

use docvc_types::{ChangeKind, PathSegment, Value, ValuePath, VersionChange};

/// Counts of each change kind in a change set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeStats {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub moves: usize,
    pub renames: usize,
}

impl ChangeStats {
    /// Tally a change set.
    pub fn from_changes(changes: &[VersionChange]) -> Self {
        let mut stats = Self::default();
        for change in changes {
            match change.kind {
                ChangeKind::Create => stats.creates += 1,
                ChangeKind::Update => stats.updates += 1,
                ChangeKind::Delete => stats.deletes += 1,
                ChangeKind::Move => stats.moves += 1,
                ChangeKind::Rename => stats.renames += 1,
            }
        }
        stats
    }

    /// Total number of changes.
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.deletes + self.moves + self.renames
    }
}

/// Compute the change set that turns `old` into `new`.
///
/// Identical values yield an empty change set; any difference yields at
/// least one change. Replaying the result over `old` with
/// [`apply_changes`](crate::apply_changes) reproduces `new`.
pub fn diff(old: &Value, new: &Value) -> Vec<VersionChange> {
    let mut changes = Vec::new();
    diff_at(&ValuePath::root(), old, new, &mut changes);
    pair_relocations(changes)
}

/// The change set recorded on the first version of a document: one
/// synthetic create at the root describing the whole content.
pub fn initial_changes(content: &Value) -> Vec<VersionChange> {
    let fields = content.leaf_count();
    vec![VersionChange::create(ValuePath::root(), content.clone())
        .with_description(format!("Initial content ({fields} fields)"))]
}

fn diff_at(path: &ValuePath, old: &Value, new: &Value, out: &mut Vec<VersionChange>) {
    if old == new {
        return;
    }

    match (old, new) {
        (Value::Map(old_map), Value::Map(new_map)) => {
            for (key, old_value) in old_map {
                let child = path.child_key(key.as_str());
                match new_map.get(key) {
                    Some(new_value) => diff_at(&child, old_value, new_value, out),
                    None => out.push(VersionChange::delete(child, old_value.clone())),
                }
            }
            for (key, new_value) in new_map {
                if !old_map.contains_key(key) {
                    out.push(VersionChange::create(path.child_key(key.as_str()), new_value.clone()));
                }
            }
        }
        (Value::Sequence(old_seq), Value::Sequence(new_seq)) => {
            let common = old_seq.len().min(new_seq.len());
            for i in 0..common {
                diff_at(&path.child_index(i), &old_seq[i], &new_seq[i], out);
            }
            // Appends ascend so each index is one past the end when replayed.
            for (i, value) in new_seq.iter().enumerate().skip(common) {
                out.push(VersionChange::create(path.child_index(i), value.clone()));
            }
            // Truncation descends so earlier removals never shift later ones.
            for i in (common..old_seq.len()).rev() {
                out.push(VersionChange::delete(path.child_index(i), old_seq[i].clone()));
            }
        }
        _ => out.push(VersionChange::update(path.clone(), old.clone(), new.clone())),
    }
}

fn is_map_entry(path: &ValuePath) -> bool {
    matches!(path.last(), Some(PathSegment::Key(_)))
}

fn relocatable(change: &VersionChange, kind: ChangeKind) -> Option<&Value> {
    if change.kind != kind || !is_map_entry(&change.path) {
        return None;
    }
    let value = match kind {
        ChangeKind::Delete => change.old_value.as_ref(),
        _ => change.new_value.as_ref(),
    }?;
    (!value.is_null()).then_some(value)
}

/// Fold matching delete/create pairs on map entries into relocations.
///
/// The relocation takes the create's position in the change set and the
/// paired delete is dropped.
fn pair_relocations(changes: Vec<VersionChange>) -> Vec<VersionChange> {
    let mut consumed = vec![false; changes.len()];
    let mut relocated: Vec<Option<VersionChange>> = vec![None; changes.len()];

    for (ci, create) in changes.iter().enumerate() {
        let Some(created) = relocatable(create, ChangeKind::Create) else {
            continue;
        };
        let matched = changes.iter().enumerate().find(|(di, delete)| {
            !consumed[*di] && relocatable(delete, ChangeKind::Delete) == Some(created)
        });
        if let Some((di, delete)) = matched {
            consumed[di] = true;
            relocated[ci] = Some(
                VersionChange::relocate(delete.path.clone(), create.path.clone(), created.clone())
                    .stamped(create.timestamp),
            );
        }
    }

    changes
        .into_iter()
        .zip(relocated)
        .enumerate()
        .filter(|(i, _)| !consumed[*i])
        .map(|(_, (change, relocation))| relocation.unwrap_or(change))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn p(s: &str) -> ValuePath {
        s.parse().unwrap()
    }

    #[test]
    fn identical_values_no_changes() {
        let doc = v(json!({"title": "Q3", "lines": [1, 2, {"a": null}]}));
        assert!(diff(&doc, &doc).is_empty());
    }

    #[test]
    fn scalar_update_at_nested_path() {
        let old = v(json!({"totals": {"net": 10, "gross": 12}}));
        let new = v(json!({"totals": {"net": 11, "gross": 12}}));
        let changes = diff(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Update);
        assert_eq!(changes[0].path, p("totals.net"));
        assert_eq!(changes[0].old_value, Some(Value::from(10)));
        assert_eq!(changes[0].new_value, Some(Value::from(11)));
    }

    #[test]
    fn added_and_removed_keys() {
        let old = v(json!({"a": 1, "b": 2}));
        let new = v(json!({"a": 1, "c": 3}));
        let changes = diff(&old, &new);
        assert_eq!(changes.len(), 2);
        assert!(changes
            .iter()
            .any(|c| c.kind == ChangeKind::Delete && c.path == p("b")));
        assert!(changes
            .iter()
            .any(|c| c.kind == ChangeKind::Create && c.path == p("c")));
    }

    #[test]
    fn kind_change_is_update() {
        let old = v(json!({"a": {"x": 1}}));
        let new = v(json!({"a": [1]}));
        let changes = diff(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Update);
        assert_eq!(changes[0].path, p("a"));
    }

    #[test]
    fn sequence_growth_and_truncation() {
        let grown = diff(&v(json!([1])), &v(json!([1, 2, 3])));
        let paths: Vec<_> = grown.iter().map(|c| c.path.to_string()).collect();
        assert_eq!(paths, vec!["[1]", "[2]"]);

        let shrunk = diff(&v(json!([1, 2, 3])), &v(json!([1])));
        let paths: Vec<_> = shrunk.iter().map(|c| c.path.to_string()).collect();
        assert_eq!(paths, vec!["[2]", "[1]"]);
        assert!(shrunk.iter().all(|c| c.kind == ChangeKind::Delete));
    }

    #[test]
    fn rename_detected_under_same_parent() {
        let old = v(json!({"totals": {"net": {"value": 5}}}));
        let new = v(json!({"totals": {"netIncome": {"value": 5}}}));
        let changes = diff(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Rename);
        assert_eq!(changes[0].from_path, Some(p("totals.net")));
        assert_eq!(changes[0].path, p("totals.netIncome"));
    }

    #[test]
    fn move_detected_across_parents() {
        let old = v(json!({"draft": {"note": "check"}, "final": {}}));
        let new = v(json!({"draft": {}, "final": {"note": "check"}}));
        let changes = diff(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Move);
        assert_eq!(changes[0].from_path, Some(p("draft.note")));
        assert_eq!(changes[0].path, p("final.note"));
    }

    #[test]
    fn null_values_are_never_paired() {
        let old = v(json!({"a": null}));
        let new = v(json!({"b": null}));
        let stats = ChangeStats::from_changes(&diff(&old, &new));
        assert_eq!(stats.creates, 1);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.renames, 0);
    }

    #[test]
    fn initial_changes_single_root_create() {
        let doc = v(json!({"a": 1, "b": [1, 2]}));
        let changes = initial_changes(&doc);
        assert_eq!(changes.len(), 1);
        assert!(changes[0].path.is_root());
        assert_eq!(changes[0].kind, ChangeKind::Create);
        assert_eq!(changes[0].description, "Initial content (3 fields)");
    }

    #[test]
    fn stats_total() {
        let old = v(json!({"a": 1, "b": 2, "c": 3}));
        let new = v(json!({"a": 9, "d": 4}));
        let stats = ChangeStats::from_changes(&diff(&old, &new));
        assert_eq!(stats.updates, 1);
        assert_eq!(stats.deletes, 2);
        assert_eq!(stats.creates, 1);
        assert_eq!(stats.total(), 4);
    }
}
