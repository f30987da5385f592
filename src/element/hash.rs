//! Element hashing for change detection.
//!
//! Provides deterministic hashing of elements and nested values so the diff
//! engine can short-circuit unchanged subtrees and callers can fingerprint
//! whole snapshots.

use sha2::{Digest, Sha256};
use serde_json::Value;

use super::model::{Element, Field};

/// Hasher for computing deterministic element content hashes.
#[derive(Debug, Default, Clone)]
pub struct ElementHasher;

impl ElementHasher {
    /// Creates a new element hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a hash of an arbitrary nested value.
    ///
    /// Map entries are hashed in key order, so the hash is independent of
    /// insertion order.
    #[must_use]
    pub fn hash_value(&self, value: &Value) -> String {
        let mut hasher = Sha256::new();
        Self::update_value(&mut hasher, value);
        hex::encode(hasher.finalize())
    }

    /// Computes a hash of a single element.
    ///
    /// This hash changes when any part of the element changes.
    #[must_use]
    pub fn hash_element(&self, element: &Element) -> String {
        let mut hasher = Sha256::new();
        hasher.update(element.kind().to_string().as_bytes());
        hasher.update(element.id().to_string().as_bytes());
        match element {
            Element::Type(object_type) => {
                for (name, field) in &object_type.fields {
                    hasher.update(name.as_bytes());
                    Self::update_field(&mut hasher, field);
                }
                for (key, value) in &object_type.annotations {
                    hasher.update(key.as_bytes());
                    Self::update_value(&mut hasher, value);
                }
            }
            Element::Field(field) => {
                Self::update_field(&mut hasher, field);
            }
            Element::Instance(instance) => {
                hasher.update(instance.type_name.as_bytes());
                Self::update_value(&mut hasher, &instance.value);
            }
        }
        hex::encode(hasher.finalize())
    }

    /// Computes a fingerprint of a whole snapshot.
    ///
    /// Elements are hashed in identity order, so the fingerprint is
    /// independent of the order the caller lists them in.
    #[must_use]
    pub fn hash_snapshot(&self, elements: &[Element]) -> String {
        let mut entries: Vec<(String, String)> = elements
            .iter()
            .map(|element| (element.id().to_string(), self.hash_element(element)))
            .collect();
        entries.sort();

        let mut hasher = Sha256::new();
        for (id, hash) in entries {
            hasher.update(id.as_bytes());
            hasher.update(hash.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }

    fn update_field(hasher: &mut Sha256, field: &Field) {
        hasher.update(field.field_type.as_bytes());
        for (key, value) in &field.annotations {
            hasher.update(key.as_bytes());
            Self::update_value(hasher, value);
        }
    }

    fn update_value(hasher: &mut Sha256, value: &Value) {
        // Type tags keep distinct shapes from colliding.
        match value {
            Value::Null => hasher.update([0u8]),
            Value::Bool(flag) => {
                hasher.update([1u8]);
                hasher.update([u8::from(*flag)]);
            }
            Value::Number(number) => {
                hasher.update([2u8]);
                hasher.update(number.to_string().as_bytes());
            }
            Value::String(text) => {
                hasher.update([3u8]);
                hasher.update(text.as_bytes());
            }
            Value::Array(items) => {
                hasher.update([4u8]);
                for item in items {
                    Self::update_value(hasher, item);
                }
            }
            Value::Object(map) => {
                hasher.update([5u8]);
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                for key in keys {
                    hasher.update(key.as_bytes());
                    if let Some(entry) = map.get(key) {
                        Self::update_value(hasher, entry);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::id::ElementId;
    use crate::element::model::Instance;
    use serde_json::json;

    fn create_test_instance(name: &str, value: Value) -> Element {
        Element::Instance(Instance::new(
            ElementId::instance("crm", "Lead", name),
            "Lead",
            value,
        ))
    }

    #[test]
    fn test_value_hash_deterministic() {
        let hasher = ElementHasher::new();
        let value = json!({"b": 2, "a": [1, 2, 3], "c": {"nested": true}});

        assert_eq!(hasher.hash_value(&value), hasher.hash_value(&value));
    }

    #[test]
    fn test_value_hash_ignores_key_order() {
        let hasher = ElementHasher::new();
        let first = json!({"a": 1, "b": 2});
        let second = json!({"b": 2, "a": 1});

        assert_eq!(hasher.hash_value(&first), hasher.hash_value(&second));
    }

    #[test]
    fn test_different_values_different_hash() {
        let hasher = ElementHasher::new();

        assert_ne!(
            hasher.hash_value(&json!({"a": 1})),
            hasher.hash_value(&json!({"a": 2}))
        );
        assert_ne!(hasher.hash_value(&json!(1)), hasher.hash_value(&json!("1")));
    }

    #[test]
    fn test_element_hash_covers_identity() {
        let hasher = ElementHasher::new();
        let first = create_test_instance("one", json!({"a": 1}));
        let second = create_test_instance("two", json!({"a": 1}));

        assert_ne!(hasher.hash_element(&first), hasher.hash_element(&second));
    }

    #[test]
    fn test_snapshot_fingerprint_ignores_element_order() {
        let hasher = ElementHasher::new();
        let first = create_test_instance("one", json!({"a": 1}));
        let second = create_test_instance("two", json!({"b": 2}));

        let forward = hasher.hash_snapshot(&[first.clone(), second.clone()]);
        let reverse = hasher.hash_snapshot(&[second, first]);

        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_short_hash() {
        let hasher = ElementHasher::new();
        let short = hasher.short_hash("abcdef1234567890abcdef1234567890");

        assert_eq!(short, "abcdef12");
        assert_eq!(short.len(), 8);
    }
}
