//! Deterministic metadata canonicalization.
//!
//! Metadata is reduced in two steps:
//! - every value becomes its canonical string (see [`canonical_value`])
//! - the resulting string map is encoded with keys in lexicographic order
//!
//! The encoding is JSON text with `", "` between entries and `": "` between
//! key and value. Strings are escaped so the output is pure printable ASCII:
//! `"` and `\` are backslash-escaped, the usual control shorthands
//! (`\b \f \n \r \t`) are used, and every other character outside
//! `0x20..=0x7e` becomes a lowercase `\uXXXX` escape (UTF-16 surrogate pairs
//! above the BMP). This matches the layout of the registry's first
//! deployment, so string-only metadata keeps its fingerprints.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::metadata::{Metadata, NormalizedMetadata};
use crate::types::Fingerprint;

/// Canonicalize metadata into its fingerprint.
///
/// Input key order never affects the output.
pub fn canonicalize(metadata: &Metadata) -> Result<Fingerprint> {
    Ok(normalize(metadata)?.fingerprint())
}

/// Reduce every metadata value to its canonical string.
pub fn normalize(metadata: &Metadata) -> Result<NormalizedMetadata> {
    let mut map = BTreeMap::new();
    for (key, value) in metadata.iter() {
        map.insert(key.to_string(), canonical_value(key, value)?);
    }
    Ok(NormalizedMetadata::from(map))
}

/// Canonical string form of a single scalar value.
///
/// Strings are taken verbatim, numbers use their JSON text, booleans and
/// null use their JSON literals. Arrays and objects have no string form.
pub fn canonical_value(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Array(_) => Err(CoreError::InvalidMetadataValue {
            key: key.to_string(),
            kind: "array",
        }),
        Value::Object(_) => Err(CoreError::InvalidMetadataValue {
            key: key.to_string(),
            kind: "object",
        }),
    }
}

/// Encode a string map canonically.
///
/// `BTreeMap` iterates in byte order of the UTF-8 keys, which is the same as
/// code point order.
pub(crate) fn encode_string_map(map: &BTreeMap<String, String>) -> String {
    let mut buf = String::with_capacity(2 + map.len() * 16);
    buf.push('{');
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            buf.push_str(", ");
        }
        encode_text(&mut buf, key);
        buf.push_str(": ");
        encode_text(&mut buf, value);
    }
    buf.push('}');
    buf
}

/// Encode a quoted, escaped string.
fn encode_text(buf: &mut String, s: &str) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            '\u{08}' => buf.push_str("\\b"),
            '\u{0c}' => buf.push_str("\\f"),
            ' '..='~' => buf.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    // Writing to a String cannot fail.
                    let _ = write!(buf, "\\u{:04x}", unit);
                }
            }
        }
    }
    buf.push('"');
}
