//! Hashing - SHA-256 for exported artifacts and report manifests
//!
//! A report hash covers the canonical JSON of the snapshot, so two exports of
//! the same form content can be recognised regardless of field order.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// SHA-256 of raw bytes as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// JSON with object keys sorted and no whitespace.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    serde_json::to_string(&sorted(value))
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

/// Hash of the report content: `sha256(engine_version + ":" + canonical entries)`.
///
/// Callers pass the header and entries only, so report id and creation time
/// do not affect it.
pub fn compute_content_hash(
    content: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(content)?;
    Ok(sha256_hex(format!("{}:{}", engine_version, canonical).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"required": "18", "actual": "12", "label": {"z": 1, "a": 2}});
        assert_eq!(
            canonical_json(&obj).unwrap(),
            r#"{"actual":"12","label":{"a":2,"z":1},"required":"18"}"#
        );
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_content_hash_ignores_key_order() {
        let a = json!({"policy": "P-1", "entries": [1, 2]});
        let b = json!({"entries": [1, 2], "policy": "P-1"});
        assert_eq!(
            compute_content_hash(&a, "1.0.0").unwrap(),
            compute_content_hash(&b, "1.0.0").unwrap()
        );
        assert_ne!(
            compute_content_hash(&a, "1.0.0").unwrap(),
            compute_content_hash(&a, "2.0.0").unwrap()
        );
    }
}
