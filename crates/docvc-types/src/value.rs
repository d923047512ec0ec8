//! Structured document content.
//!
//! [`Value`] is the tagged variant every engine component pattern-matches on.
//! Maps are key-ordered (`BTreeMap`), so any traversal or serialization of a
//! value is independent of the order in which its keys were inserted. The
//! serde representation is untagged: a `Value` reads and writes as plain JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::path::{PathSegment, ValuePath};

/// An opaque, arbitrarily nested document value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Sequence(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// An empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Name of this value's variant, for messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Map(_) => "map",
        }
    }

    /// Returns `true` for null, booleans, numbers, and strings.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Sequence(_) | Value::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Number of leaves: scalars and empty containers each count as one.
    pub fn leaf_count(&self) -> usize {
        match self {
            Value::Map(m) if !m.is_empty() => m.values().map(Value::leaf_count).sum(),
            Value::Sequence(s) if !s.is_empty() => s.iter().map(Value::leaf_count).sum(),
            _ => 1,
        }
    }

    /// Look up the value at `path`.
    pub fn get_path(&self, path: &ValuePath) -> Option<&Value> {
        let mut current = self;
        for segment in path.segments() {
            current = match (current, segment) {
                (Value::Map(m), PathSegment::Key(k)) => m.get(k)?,
                (Value::Sequence(s), PathSegment::Index(i)) => s.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write `value` at `path`, creating missing intermediate containers.
    ///
    /// A sequence index may address an existing element or the position one
    /// past the end (append). Setting the root path replaces the whole value.
    pub fn set_path(&mut self, path: &ValuePath, value: Value) -> Result<(), TypeError> {
        let segments = path.segments();
        let Some((last, parents)) = segments.split_last() else {
            *self = value;
            return Ok(());
        };

        let mut current = self;
        for (depth, segment) in parents.iter().enumerate() {
            let next = &segments[depth + 1];
            current = descend_or_create(current, segment, next, path)?;
        }

        match (current, last) {
            (Value::Map(m), PathSegment::Key(k)) => {
                m.insert(k.clone(), value);
                Ok(())
            }
            (Value::Sequence(s), PathSegment::Index(i)) => {
                if *i < s.len() {
                    s[*i] = value;
                    Ok(())
                } else if *i == s.len() {
                    s.push(value);
                    Ok(())
                } else {
                    Err(out_of_bounds(path, *i, s.len()))
                }
            }
            (other, _) => Err(TypeError::InvalidPath {
                path: path.to_string(),
                reason: format!("cannot address into a {}", other.kind_name()),
            }),
        }
    }

    /// Remove and return the value at `path`.
    ///
    /// Removing a sequence element shifts later elements down. Removing the
    /// root resets the value to null.
    pub fn remove_path(&mut self, path: &ValuePath) -> Result<Value, TypeError> {
        let segments = path.segments();
        let Some((last, parents)) = segments.split_last() else {
            return Ok(std::mem::take(self));
        };

        let mut current = self;
        for segment in parents {
            current = match (current, segment) {
                (Value::Map(m), PathSegment::Key(k)) => m.get_mut(k),
                (Value::Sequence(s), PathSegment::Index(i)) => s.get_mut(*i),
                _ => None,
            }
            .ok_or_else(|| missing(path))?;
        }

        match (current, last) {
            (Value::Map(m), PathSegment::Key(k)) => m.remove(k).ok_or_else(|| missing(path)),
            (Value::Sequence(s), PathSegment::Index(i)) if *i < s.len() => Ok(s.remove(*i)),
            _ => Err(missing(path)),
        }
    }
}

fn descend_or_create<'a>(
    current: &'a mut Value,
    segment: &PathSegment,
    next: &PathSegment,
    path: &ValuePath,
) -> Result<&'a mut Value, TypeError> {
    let empty_for_next = || match next {
        PathSegment::Key(_) => Value::map(),
        PathSegment::Index(_) => Value::Sequence(Vec::new()),
    };

    match (current, segment) {
        (Value::Map(m), PathSegment::Key(k)) => Ok(m.entry(k.clone()).or_insert_with(empty_for_next)),
        (Value::Sequence(s), PathSegment::Index(i)) => {
            if *i == s.len() {
                s.push(empty_for_next());
            }
            let len = s.len();
            s.get_mut(*i).ok_or_else(|| out_of_bounds(path, *i, len))
        }
        (other, _) => Err(TypeError::InvalidPath {
            path: path.to_string(),
            reason: format!("cannot address into a {}", other.kind_name()),
        }),
    }
}

fn missing(path: &ValuePath) -> TypeError {
    TypeError::InvalidPath {
        path: path.to_string(),
        reason: "no value at path".into(),
    }
}

fn out_of_bounds(path: &ValuePath, index: usize, len: usize) -> TypeError {
    TypeError::InvalidPath {
        path: path.to_string(),
        reason: format!("index {index} out of bounds for sequence of length {len}"),
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Value::Number(n),
            Value::String(s) => serde_json::Value::String(s),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become null.
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        Value::from(json!({
            "title": "Q3 report",
            "total": 1200,
            "lineItems": [
                {"label": "revenue", "amount": 2000},
                {"label": "costs", "amount": -800}
            ],
            "notes": {}
        }))
    }

    #[test]
    fn json_roundtrip_is_plain() {
        let value = doc();
        let text = serde_json::to_string(&value).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, value);
        let plain: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(plain["lineItems"][1]["amount"], json!(-800));
    }

    #[test]
    fn key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"a":1,"b":{"x":1,"y":2}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b":{"y":2,"x":1},"a":1}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn leaf_count_counts_scalars_and_empty_containers() {
        // title, total, 2 x (label, amount), notes
        assert_eq!(doc().leaf_count(), 7);
        assert_eq!(Value::Null.leaf_count(), 1);
    }

    #[test]
    fn get_path_navigates() {
        let value = doc();
        let path: ValuePath = "lineItems[1].label".parse().unwrap();
        assert_eq!(value.get_path(&path), Some(&Value::from("costs")));
        assert!(value.get_path(&"lineItems[5]".parse().unwrap()).is_none());
        assert!(value.get_path(&"title.x".parse().unwrap()).is_none());
    }

    #[test]
    fn set_path_creates_intermediates() {
        let mut value = Value::map();
        value
            .set_path(&"meta.owners[0].name".parse().unwrap(), Value::from("ana"))
            .unwrap();
        assert_eq!(value, Value::from(json!({"meta": {"owners": [{"name": "ana"}]}})));
    }

    #[test]
    fn set_path_appends_and_rejects_gaps() {
        let mut value = doc();
        value
            .set_path(&"lineItems[2]".parse().unwrap(), Value::from("tax"))
            .unwrap();
        assert_eq!(value.get_path(&"lineItems[2]".parse().unwrap()), Some(&Value::from("tax")));
        assert!(value
            .set_path(&"lineItems[9]".parse().unwrap(), Value::Null)
            .is_err());
    }

    #[test]
    fn set_root_replaces_everything() {
        let mut value = doc();
        value.set_path(&ValuePath::root(), Value::from(5)).unwrap();
        assert_eq!(value, Value::from(5));
    }

    #[test]
    fn set_path_into_scalar_fails() {
        let mut value = doc();
        assert!(value
            .set_path(&"title.sub".parse().unwrap(), Value::Null)
            .is_err());
    }

    #[test]
    fn remove_path_shifts_sequences() {
        let mut value = doc();
        let removed = value.remove_path(&"lineItems[0]".parse().unwrap()).unwrap();
        assert_eq!(removed, Value::from(json!({"label": "revenue", "amount": 2000})));
        assert_eq!(
            value.get_path(&"lineItems[0].label".parse().unwrap()),
            Some(&Value::from("costs"))
        );
        assert!(value.remove_path(&"missing".parse().unwrap()).is_err());
    }

    #[test]
    fn non_finite_float_becomes_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
        assert_eq!(Value::from(1.5), Value::from(json!(1.5)));
    }
}
