use serde::{Deserialize, Serialize};

use crate::path::ValuePath;
use crate::temporal::TemporalAnchor;
use crate::value::Value;

/// The kind of an atomic edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
    /// A value relocated to a different parent.
    Move,
    /// A map entry re-keyed under the same parent.
    Rename,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
            ChangeKind::Move => "move",
            ChangeKind::Rename => "rename",
        };
        f.write_str(s)
    }
}

/// One atomic edit between a version and its parent.
///
/// For `move` and `rename`, `from_path` is where the value used to live and
/// `path` is where it lives now.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionChange {
    pub kind: ChangeKind,
    pub path: ValuePath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_path: Option<ValuePath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    pub timestamp: TemporalAnchor,
    pub description: String,
}

impl VersionChange {
    pub fn create(path: ValuePath, value: Value) -> Self {
        let description = format!("Created {path}");
        Self {
            kind: ChangeKind::Create,
            path,
            from_path: None,
            old_value: None,
            new_value: Some(value),
            timestamp: TemporalAnchor::zero(),
            description,
        }
    }

    pub fn update(path: ValuePath, old: Value, new: Value) -> Self {
        let description = format!("Updated {path}");
        Self {
            kind: ChangeKind::Update,
            path,
            from_path: None,
            old_value: Some(old),
            new_value: Some(new),
            timestamp: TemporalAnchor::zero(),
            description,
        }
    }

    pub fn delete(path: ValuePath, old: Value) -> Self {
        let description = format!("Deleted {path}");
        Self {
            kind: ChangeKind::Delete,
            path,
            from_path: None,
            old_value: Some(old),
            new_value: None,
            timestamp: TemporalAnchor::zero(),
            description,
        }
    }

    /// A `rename` when both paths share a parent, otherwise a `move`.
    pub fn relocate(from: ValuePath, to: ValuePath, value: Value) -> Self {
        let kind = if from.parent() == to.parent() {
            ChangeKind::Rename
        } else {
            ChangeKind::Move
        };
        let verb = if kind == ChangeKind::Rename { "Renamed" } else { "Moved" };
        let description = format!("{verb} {from} -> {to}");
        Self {
            kind,
            path: to,
            from_path: Some(from),
            old_value: None,
            new_value: Some(value),
            timestamp: TemporalAnchor::zero(),
            description,
        }
    }

    /// Replace the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the timestamp this change was recorded at.
    pub fn stamped(mut self, timestamp: TemporalAnchor) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocate_within_parent_is_rename() {
        let change = VersionChange::relocate(
            "totals.net".parse().unwrap(),
            "totals.netIncome".parse().unwrap(),
            Value::from(10),
        );
        assert_eq!(change.kind, ChangeKind::Rename);
        assert_eq!(change.description, "Renamed totals.net -> totals.netIncome");
    }

    #[test]
    fn relocate_across_parents_is_move() {
        let change = VersionChange::relocate(
            "draft.note".parse().unwrap(),
            "final.note".parse().unwrap(),
            Value::from("x"),
        );
        assert_eq!(change.kind, ChangeKind::Move);
        assert_eq!(change.from_path, Some("draft.note".parse().unwrap()));
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChangeKind::Rename).unwrap(), "\"rename\"");
    }

    #[test]
    fn serde_omits_absent_values() {
        let change = VersionChange::delete(ValuePath::key("x"), Value::from(1))
            .stamped(TemporalAnchor::new(5, 0, 0));
        let json = serde_json::to_value(&change).unwrap();
        assert!(json.get("new_value").is_none());
        assert!(json.get("from_path").is_none());
        let parsed: VersionChange = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, change);
    }
}
