//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use idreg_core::Metadata;

/// Generate a metadata key.
pub fn key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}".prop_map(String::from)
}

/// Generate a namespace or entity type: never empty.
pub fn identity_part() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9._-]{0,23}".prop_map(String::from)
}

/// Generate a scalar metadata value of any accepted kind.
pub fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => any::<String>().prop_map(Value::String),
        2 => any::<i64>().prop_map(Value::from),
        1 => any::<bool>().prop_map(Value::Bool),
        1 => Just(Value::Null),
    ]
}

/// Generate a value that no canonical string exists for.
pub fn nested_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(any::<i64>(), 0..4).prop_map(|v| json!(v)),
        (key(), any::<String>()).prop_map(|(k, v)| {
            let mut map = Map::new();
            map.insert(k, Value::String(v));
            Value::Object(map)
        }),
    ]
}

/// Generate distinct-keyed scalar entries in arbitrary order.
pub fn scalar_entries(max_len: usize) -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::btree_map(key(), scalar_value(), 0..=max_len)
        .prop_map(|map| map.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Generate scalar metadata.
pub fn scalar_metadata() -> impl Strategy<Value = Metadata> {
    scalar_entries(8).prop_map(|entries| metadata_from_pairs(&entries))
}

/// Generate the same metadata twice with independent key orders.
pub fn shuffled_metadata() -> impl Strategy<Value = (Metadata, Metadata)> {
    scalar_entries(8).prop_flat_map(|entries| {
        let first = metadata_from_pairs(&entries);
        Just(entries)
            .prop_shuffle()
            .prop_map(move |shuffled| (first.clone(), metadata_from_pairs(&shuffled)))
    })
}

/// Build metadata from owned pairs, keeping their order.
pub fn metadata_from_pairs(pairs: &[(String, Value)]) -> Metadata {
    pairs.iter().map(|(k, v)| (k.as_str(), v.clone())).collect()
}

/// Parameters for one get-or-create call.
#[derive(Debug, Clone)]
pub struct MetadataParams {
    pub namespace: String,
    pub entity_type: String,
    pub entries: Vec<(String, Value)>,
}

impl MetadataParams {
    pub fn metadata(&self) -> Metadata {
        metadata_from_pairs(&self.entries)
    }
}

impl Arbitrary for MetadataParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (identity_part(), identity_part(), scalar_entries(6))
            .prop_map(|(namespace, entity_type, entries)| MetadataParams {
                namespace,
                entity_type,
                entries,
            })
            .boxed()
    }
}
