//! Hashing - SHA-256 over artifacts and canonical manifests
//!
//! Identical inputs must hash identically across runs.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Lowercase hex SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().fold(String::with_capacity(64), |mut hex, byte| {
        let _ = write!(hex, "{byte:02x}");
        hex
    })
}

/// Compact JSON with object keys in lexical order.
///
/// `serde_json::Map` is a `BTreeMap` unless `preserve_order` is enabled,
/// which this crate does not do, so a round trip through `Value` sorts keys.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(&serde_json::to_value(value)?)
}

/// Digest of the canonical form; key order in the input never matters.
pub fn compute_manifest_hash<T: Serialize>(manifest: &T) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(manifest)?.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": {"y": 0, "b": 1}});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":{"b":1,"y":0},"z":1}"#);
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_manifest_hash_ignores_key_order() {
        let h1 = compute_manifest_hash(&json!({"id": "mon_test", "type": "monster"})).unwrap();
        let h2 = compute_manifest_hash(&json!({"type": "monster", "id": "mon_test"})).unwrap();
        assert_eq!(h1, h2);
    }
}
