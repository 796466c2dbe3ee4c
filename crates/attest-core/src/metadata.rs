//! Key/value annotations attached to individual tests.
//!
//! Metadata is free-form: a bug tracker id, an owner, a data label. Reporters
//! render it next to the fault it belongs to, so anything recorded here shows
//! up when the test goes wrong.

use std::collections::BTreeMap;
use std::fmt;

/// A single metadata value: either one string or an ordered list of strings.
///
/// Values start out as [`MetadataValue::Single`]. Appending to an existing
/// key promotes it to [`MetadataValue::Sequence`], preserving insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Single(String),
    Sequence(Vec<String>),
}

impl MetadataValue {
    fn push(&mut self, value: String) {
        match self {
            MetadataValue::Single(first) => {
                let first = std::mem::take(first);
                *self = MetadataValue::Sequence(vec![first, value]);
            }
            MetadataValue::Sequence(values) => values.push(value),
        }
    }

    /// All strings held by this value, in insertion order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            MetadataValue::Single(value) => vec![value.as_str()],
            MetadataValue::Sequence(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Single(value) => f.write_str(value),
            MetadataValue::Sequence(values) => write!(f, "{values:?}"),
        }
    }
}

/// Annotations for one test, keyed by name and iterated in sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<String, MetadataValue>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to a single value, replacing anything already stored.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), MetadataValue::Single(value.into()));
    }

    /// Appends `value` under `key`, promoting a single value to a sequence.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                self.entries.insert(key, MetadataValue::Single(value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
