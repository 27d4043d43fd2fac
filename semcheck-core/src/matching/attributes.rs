//! Attribute sets collected at one hierarchy level

use std::collections::HashMap;

use opentelemetry_proto::tonic::common::v1::{any_value, KeyValue};

/// Key → typed value view over a slice of OTLP key/values
///
/// Borrowed from the export payload and discarded with it. A key present
/// without a value still counts as present.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet<'a> {
    values: HashMap<&'a str, Option<&'a any_value::Value>>,
}

impl<'a> AttributeSet<'a> {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a slice of key/values; later duplicates win
    pub fn from_key_values(attributes: &'a [KeyValue]) -> Self {
        let values = attributes
            .iter()
            .map(|kv| {
                let value = kv.value.as_ref().and_then(|v| v.value.as_ref());
                (kv.key.as_str(), value)
            })
            .collect();
        Self { values }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// `None` when absent, `Some(None)` when present without a value
    pub fn get(&self, key: &str) -> Option<Option<&'a any_value::Value>> {
        self.values.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> From<&'a [KeyValue]> for AttributeSet<'a> {
    fn from(attributes: &'a [KeyValue]) -> Self {
        Self::from_key_values(attributes)
    }
}
