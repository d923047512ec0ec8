//! Canonical byte encoding of a [`Value`].
//!
//! Every node is written as a one-byte type tag followed by a
//! length-prefixed body, so no two distinct values share an encoding. Map
//! entries are written in key order (the map is a `BTreeMap`), which makes the
//! encoding independent of key insertion order.
//!
//! | tag | body |
//! |-----|------|
//! | `n` | (empty) |
//! | `b` | `0` or `1` |
//! | `d` | len, decimal text of the number |
//! | `s` | len, UTF-8 bytes |
//! | `q` | count, items |
//! | `m` | count, (key len, key, value)* |

use docvc_types::Value;

/// Encode `value` canonically.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode(value, &mut out);
    out
}

fn encode(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(b'n'),
        Value::Bool(b) => {
            out.push(b'b');
            out.push(u8::from(*b));
        }
        Value::Number(n) => {
            out.push(b'd');
            write_bytes(n.to_string().as_bytes(), out);
        }
        Value::String(s) => {
            out.push(b's');
            write_bytes(s.as_bytes(), out);
        }
        Value::Sequence(items) => {
            out.push(b'q');
            write_len(items.len(), out);
            for item in items {
                encode(item, out);
            }
        }
        Value::Map(entries) => {
            out.push(b'm');
            write_len(entries.len(), out);
            for (key, item) in entries {
                write_bytes(key.as_bytes(), out);
                encode(item, out);
            }
        }
    }
}

fn write_len(len: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&(len as u64).to_be_bytes());
}

fn write_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    write_len(bytes.len(), out);
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_is_irrelevant() {
        let a: Value = serde_json::from_str(r#"{"z":1,"a":[1,2]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":[1,2],"z":1}"#).unwrap();
        assert_eq!(canonical_bytes(&a), canonical_bytes(&b));
    }

    #[test]
    fn string_and_number_do_not_collide() {
        let s = Value::from("1");
        let n = Value::from(1);
        assert_ne!(canonical_bytes(&s), canonical_bytes(&n));
    }

    #[test]
    fn nesting_is_unambiguous() {
        let flat = Value::from(json!(["a", "b"]));
        let nested = Value::from(json!([["a", "b"]]));
        assert_ne!(canonical_bytes(&flat), canonical_bytes(&nested));
    }

    #[test]
    fn sequence_order_matters() {
        let a = Value::from(json!([1, 2]));
        let b = Value::from(json!([2, 1]));
        assert_ne!(canonical_bytes(&a), canonical_bytes(&b));
    }
}
