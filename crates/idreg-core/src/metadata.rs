//! Caller-supplied metadata and its normalized form.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::canonical;
use crate::error::{CoreError, Result};
use crate::types::Fingerprint;

/// Metadata as presented by a caller.
///
/// Keeps insertion order so that the canonicalizer, not the container, is
/// what makes identity order-independent. Inserting an existing key
/// replaces its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, Value)>,
    /// Key -> position in `entries`.
    index: HashMap<String, usize>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Builder-style [`Metadata::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let mut metadata = Metadata {
            entries: Vec::with_capacity(lower),
            index: HashMap::with_capacity(lower),
        };
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// Metadata after every value has been reduced to its canonical string.
///
/// This is what gets stored and returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedMetadata(BTreeMap<String, String>);

impl NormalizedMetadata {
    /// Encode into the canonical fingerprint text.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_canonical(canonical::encode_string_map(&self.0))
    }

    /// Decode fingerprint text (as read from storage) back into a mapping.
    pub fn from_fingerprint(fingerprint: &Fingerprint) -> Result<Self> {
        let map: BTreeMap<String, String> = serde_json::from_str(fingerprint.as_str())
            .map_err(|e| CoreError::MalformedFingerprint(e.to_string()))?;
        Ok(Self(map))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for NormalizedMetadata {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}
