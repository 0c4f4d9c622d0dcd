//! Golden fingerprint vectors.
//!
//! Fingerprints are stored and compared byte for byte, so these pin the
//! encoding. A change that breaks one of them orphans every existing record
//! with that shape of metadata.

use serde_json::Value;

use idreg_core::{canonicalize, Metadata};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Metadata as a JSON object, in caller order.
    pub metadata_json: &'static str,
    /// Expected fingerprint text.
    pub expected_fingerprint: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "two strings out of order",
            metadata_json: r#"{"region": "EU", "name": "Acme"}"#,
            expected_fingerprint: r#"{"name": "Acme", "region": "EU"}"#,
        },
        GoldenVector {
            name: "empty metadata",
            metadata_json: "{}",
            expected_fingerprint: "{}",
        },
        GoldenVector {
            name: "numbers use their JSON text",
            metadata_json: r#"{"ratio": 1.5, "count": 42, "delta": -7}"#,
            expected_fingerprint: r#"{"count": "42", "delta": "-7", "ratio": "1.5"}"#,
        },
        GoldenVector {
            name: "booleans and null",
            metadata_json: r#"{"deleted": null, "active": true, "archived": false}"#,
            expected_fingerprint: r#"{"active": "true", "archived": "false", "deleted": "null"}"#,
        },
        GoldenVector {
            name: "quote and backslash",
            metadata_json: r#"{"q": "say \"hi\"", "p": "C:\\tmp"}"#,
            expected_fingerprint: r#"{"p": "C:\\tmp", "q": "say \"hi\""}"#,
        },
        GoldenVector {
            name: "control characters",
            metadata_json: r#"{"t": "a\tb\nc", "x": "\u0001"}"#,
            expected_fingerprint: r#"{"t": "a\tb\nc", "x": "\u0001"}"#,
        },
        GoldenVector {
            name: "non-ascii values",
            metadata_json: r#"{"emoji": "😀", "city": "Zürich"}"#,
            expected_fingerprint: r#"{"city": "Z\u00fcrich", "emoji": "\ud83d\ude00"}"#,
        },
        GoldenVector {
            name: "non-ascii keys sort by code point",
            metadata_json: r#"{"é": "x", "z": "y", "A": "w"}"#,
            expected_fingerprint: r#"{"A": "w", "z": "y", "\u00e9": "x"}"#,
        },
        GoldenVector {
            name: "string that looks like a number",
            metadata_json: r#"{"count": "42"}"#,
            expected_fingerprint: r#"{"count": "42"}"#,
        },
    ]
}

/// Build caller metadata from a golden vector.
///
/// Panics if the vector's JSON is not an object; vectors are static data.
pub fn metadata_from_vector(vector: &GoldenVector) -> Metadata {
    let value: Value = serde_json::from_str(vector.metadata_json)
        .unwrap_or_else(|e| panic!("vector '{}' is not JSON: {e}", vector.name));
    match value {
        Value::Object(map) => Metadata::from(map),
        other => panic!("vector '{}' is not an object: {other}", vector.name),
    }
}

/// Verify all golden vectors canonicalize to their expected fingerprint.
///
/// Returns `(name, matches, actual)` for each vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let actual = match canonicalize(&metadata_from_vector(v)) {
                Ok(fingerprint) => fingerprint.as_str().to_string(),
                Err(e) => format!("error: {e}"),
            };
            let matches = actual == v.expected_fingerprint;
            (v.name.to_string(), matches, actual)
        })
        .collect()
}
