//! Replay a change set over a base value.

use docvc_types::{ChangeKind, Value, VersionChange};

use crate::error::{DiffError, DiffResult};

/// Replay `changes` in order over a copy of `base`.
///
/// For any `old` and `new`, `apply_changes(old, &diff(old, new))` returns
/// `new`, which is how a stored version's change set is reconciled with
/// its parent.
pub fn apply_changes(base: &Value, changes: &[VersionChange]) -> DiffResult<Value> {
    let mut value = base.clone();
    for change in changes {
        apply_one(&mut value, change)?;
    }
    Ok(value)
}

fn apply_one(value: &mut Value, change: &VersionChange) -> DiffResult<()> {
    let failed = |source| DiffError::Apply {
        kind: change.kind,
        path: change.path.clone(),
        source,
    };

    match change.kind {
        ChangeKind::Create | ChangeKind::Update => {
            let new_value = new_value(change)?;
            value.set_path(&change.path, new_value).map_err(failed)
        }
        ChangeKind::Delete => value.remove_path(&change.path).map(drop).map_err(failed),
        ChangeKind::Move | ChangeKind::Rename => {
            let from = change.from_path.as_ref().ok_or_else(|| DiffError::MissingSource {
                kind: change.kind,
                path: change.path.clone(),
            })?;
            let moved = value.remove_path(from).map_err(failed)?;
            let new_value = change.new_value.clone().unwrap_or(moved);
            value.set_path(&change.path, new_value).map_err(failed)
        }
    }
}

fn new_value(change: &VersionChange) -> DiffResult<Value> {
    change.new_value.clone().ok_or_else(|| DiffError::MissingValue {
        kind: change.kind,
        path: change.path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::{diff, initial_changes};
    use docvc_types::ValuePath;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn replays_nested_edits() {
        let old = v(json!({"title": "Q3", "lines": [{"amount": 1}, {"amount": 2}], "draft": true}));
        let new = v(json!({"title": "Q3 final", "lines": [{"amount": 1}], "approved": true}));
        assert_eq!(apply_changes(&old, &diff(&old, &new)).unwrap(), new);
    }

    #[test]
    fn replays_rename() {
        let old = v(json!({"totals": {"net": {"value": 5}}}));
        let new = v(json!({"totals": {"netIncome": {"value": 5}}}));
        assert_eq!(apply_changes(&old, &diff(&old, &new)).unwrap(), new);
    }

    #[test]
    fn initial_changes_rebuild_content_from_null() {
        let doc = v(json!({"a": [1, 2], "b": {"c": null}}));
        assert_eq!(apply_changes(&Value::Null, &initial_changes(&doc)).unwrap(), doc);
    }

    #[test]
    fn delete_of_missing_path_fails() {
        let change = VersionChange::delete("missing".parse().unwrap(), Value::from(1));
        let err = apply_changes(&v(json!({})), &[change]).unwrap_err();
        assert!(matches!(err, DiffError::Apply { kind: ChangeKind::Delete, .. }));
    }

    #[test]
    fn relocation_without_source_fails() {
        let mut change =
            VersionChange::relocate(ValuePath::key("a"), ValuePath::key("b"), Value::from(1));
        change.from_path = None;
        let err = apply_changes(&v(json!({"a": 1})), &[change]).unwrap_err();
        assert!(matches!(err, DiffError::MissingSource { .. }));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeMap;

        fn arb_value() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                (-50i64..50).prop_map(Value::from),
                "[a-c]{0,2}".prop_map(Value::String),
            ];
            leaf.prop_recursive(3, 24, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Sequence),
                    prop::collection::btree_map("[a-e]", inner, 0..4)
                        .prop_map(|m: BTreeMap<String, Value>| Value::Map(m)),
                ]
            })
        }

        proptest! {
            #[test]
            fn diff_then_apply_reproduces_target(old in arb_value(), new in arb_value()) {
                let changes = diff(&old, &new);
                prop_assert_eq!(apply_changes(&old, &changes).unwrap(), new);
            }

            #[test]
            fn diff_is_empty_only_for_equal_values(old in arb_value(), new in arb_value()) {
                prop_assert_eq!(diff(&old, &new).is_empty(), old == new);
            }
        }
    }
}
