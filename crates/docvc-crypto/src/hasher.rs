use docvc_types::{ContentHash, DocumentVersion, Value};

use crate::canonical::canonical_bytes;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so document content and any other hashed artifact never
/// share a digest even for identical bytes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for document content.
    pub const CONTENT: Self = Self {
        domain: "docvc-content-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash a document value over its canonical encoding.
    pub fn hash_value(&self, value: &Value) -> ContentHash {
        self.hash(&canonical_bytes(value))
    }

    /// Verify that `value` produces the expected digest.
    pub fn verify(&self, value: &Value, expected: &ContentHash) -> bool {
        self.hash_value(value) == *expected
    }

    /// Verify a stored version's `content_hash` against its `content`.
    pub fn verify_version(&self, version: &DocumentVersion) -> bool {
        self.verify(&version.content, &version.content_hash)
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn hash_is_deterministic() {
        let value = Value::from(json!({"title": "Q3", "total": 10}));
        assert_eq!(
            ContentHasher::CONTENT.hash_value(&value),
            ContentHasher::CONTENT.hash_value(&value)
        );
    }

    #[test]
    fn key_insertion_order_does_not_change_hash() {
        let a: Value = serde_json::from_str(r#"{"b":{"y":1,"x":2},"a":true}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":true,"b":{"x":2,"y":1}}"#).unwrap();
        assert_eq!(
            ContentHasher::CONTENT.hash_value(&a),
            ContentHasher::CONTENT.hash_value(&b)
        );
    }

    #[test]
    fn different_content_different_hash() {
        let a = Value::from(json!({"total": 10}));
        let b = Value::from(json!({"total": 11}));
        assert_ne!(
            ContentHasher::CONTENT.hash_value(&a),
            ContentHasher::CONTENT.hash_value(&b)
        );
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        let custom = ContentHasher::new("docvc-other-v1");
        assert_ne!(ContentHasher::CONTENT.hash(data), custom.hash(data));
        assert_eq!(custom.domain(), "docvc-other-v1");
    }

    #[test]
    fn verify_detects_tampering() {
        let value = Value::from(json!({"total": 10}));
        let hash = ContentHasher::CONTENT.hash_value(&value);
        assert!(ContentHasher::CONTENT.verify(&value, &hash));
        assert!(!ContentHasher::CONTENT.verify(&Value::from(json!({"total": 9})), &hash));
    }

    #[test]
    fn never_null() {
        assert!(!ContentHasher::CONTENT.hash_value(&Value::Null).is_null());
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Sequence),
                prop::collection::vec(("[a-z]{1,4}", inner), 0..5)
                    .prop_map(|entries| Value::Map(entries.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn hash_independent_of_insertion_order(entries in prop::collection::btree_map("[a-z]{1,4}", arb_value(), 0..8)) {
            let render = |pairs: Vec<(&String, &Value)>| {
                let body: Vec<String> = pairs
                    .into_iter()
                    .map(|(k, v)| format!("{}:{}", serde_json::to_string(k).unwrap(), serde_json::to_string(v).unwrap()))
                    .collect();
                format!("{{{}}}", body.join(","))
            };
            let forward = render(entries.iter().collect());
            let backward = render(entries.iter().rev().collect());
            let a: Value = serde_json::from_str(&forward).unwrap();
            let b: Value = serde_json::from_str(&backward).unwrap();
            prop_assert_eq!(
                ContentHasher::CONTENT.hash_value(&a),
                ContentHasher::CONTENT.hash_value(&b)
            );
        }

        #[test]
        fn hash_is_stable_across_serde_roundtrip(value in arb_value()) {
            let text = serde_json::to_string(&value).unwrap();
            let parsed: Value = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(
                ContentHasher::CONTENT.hash_value(&value),
                ContentHasher::CONTENT.hash_value(&parsed)
            );
        }
    }
}
