//! Leaf views of a document value.
//!
//! A leaf is a scalar or an empty container. Flattening a value maps every
//! leaf path to its leaf; conflict detection and three-way overlay work on
//! these maps so that independent edits to sibling fields never collide.

use std::collections::BTreeMap;

use docvc_types::{PathSegment, Value, ValuePath};

/// Map every leaf path in `value` to its leaf.
pub fn flatten(value: &Value) -> BTreeMap<ValuePath, Value> {
    let mut leaves = BTreeMap::new();
    flatten_into(ValuePath::root(), value, &mut leaves);
    leaves
}

/// Flatten `value` as if it lived at `at`, inserting into `leaves`.
pub(crate) fn flatten_into(at: ValuePath, value: &Value, leaves: &mut BTreeMap<ValuePath, Value>) {
    match value {
        Value::Map(m) if !m.is_empty() => {
            for (key, child) in m {
                flatten_into(at.child_key(key.as_str()), child, leaves);
            }
        }
        Value::Sequence(s) if !s.is_empty() => {
            for (i, child) in s.iter().enumerate() {
                flatten_into(at.child_index(i), child, leaves);
            }
        }
        leaf => {
            leaves.insert(at, leaf.clone());
        }
    }
}

/// Rebuild a value from a leaf map.
///
/// Where a path carries both a leaf and deeper leaves, the deeper leaves
/// win. Index children become a sequence in index order, compacting any
/// gaps; a node mixing keys and indices becomes a map. An empty leaf map
/// rebuilds to null.
pub fn unflatten(leaves: &BTreeMap<ValuePath, Value>) -> Value {
    let mut root = Node::default();
    for (path, leaf) in leaves {
        let mut node = &mut root;
        for segment in path.segments() {
            node = node.children.entry(segment.clone()).or_default();
        }
        node.leaf = Some(leaf.clone());
    }
    root.into_value()
}

/// Paths whose leaf differs between `base` and `side`, with the value on
/// `side` (`None` when `side` no longer has a leaf there).
pub fn changed_leaves(
    base: &BTreeMap<ValuePath, Value>,
    side: &BTreeMap<ValuePath, Value>,
) -> BTreeMap<ValuePath, Option<Value>> {
    let mut changed = BTreeMap::new();
    for (path, value) in side {
        if base.get(path) != Some(value) {
            changed.insert(path.clone(), Some(value.clone()));
        }
    }
    for path in base.keys() {
        if !side.contains_key(path) {
            changed.insert(path.clone(), None);
        }
    }
    changed
}

#[derive(Default)]
struct Node {
    leaf: Option<Value>,
    children: BTreeMap<PathSegment, Node>,
}

impl Node {
    fn into_value(self) -> Value {
        if self.children.is_empty() {
            return self.leaf.unwrap_or_default();
        }

        let indexed = self
            .children
            .keys()
            .all(|segment| matches!(segment, PathSegment::Index(_)));

        if indexed {
            Value::Sequence(self.children.into_values().map(Node::into_value).collect())
        } else {
            Value::Map(
                self.children
                    .into_iter()
                    .map(|(segment, child)| {
                        let key = match segment {
                            PathSegment::Key(key) => key,
                            PathSegment::Index(i) => i.to_string(),
                        };
                        (key, child.into_value())
                    })
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> ValuePath {
        s.parse().unwrap()
    }

    #[test]
    fn flatten_lists_scalars_and_empty_containers() {
        let doc = Value::from(json!({"a": {"b": 1, "c": []}, "d": [true, {}]}));
        let leaves = flatten(&doc);
        let paths: Vec<String> = leaves.keys().map(ToString::to_string).collect();
        assert_eq!(paths, vec!["a.b", "a.c", "d[0]", "d[1]"]);
        assert_eq!(leaves[&p("a.c")], Value::Sequence(Vec::new()));
    }

    #[test]
    fn flatten_scalar_root() {
        let leaves = flatten(&Value::from("plain"));
        assert_eq!(leaves.len(), 1);
        assert!(leaves.contains_key(&ValuePath::root()));
    }

    #[test]
    fn unflatten_inverts_flatten() {
        let doc = Value::from(json!({
            "title": "Q3",
            "lines": [{"amount": 1}, {"amount": 2, "tags": []}],
            "meta": {}
        }));
        assert_eq!(unflatten(&flatten(&doc)), doc);
    }

    #[test]
    fn unflatten_deeper_leaves_win() {
        let mut leaves = BTreeMap::new();
        leaves.insert(p("a"), Value::from(7));
        leaves.insert(p("a.z"), Value::from(1));
        assert_eq!(unflatten(&leaves), Value::from(json!({"a": {"z": 1}})));
    }

    #[test]
    fn unflatten_empty_is_null() {
        assert_eq!(unflatten(&BTreeMap::new()), Value::Null);
    }

    #[test]
    fn changed_leaves_reports_removals_as_none() {
        let base = flatten(&Value::from(json!({"a": 1, "b": 2})));
        let side = flatten(&Value::from(json!({"a": 1, "c": 3})));
        let changed = changed_leaves(&base, &side);
        assert_eq!(changed.len(), 2);
        assert_eq!(changed[&p("b")], None);
        assert_eq!(changed[&p("c")], Some(Value::from(3)));
    }
}
