//! Mapped object representation.
//!
//! A [`Record`] is the tagged field-map standing in for a dynamic object:
//! a class-name tag plus field-name → [`Value`] entries. The per-class
//! descriptor table ([`crate::Table`]) drives which fields are meaningful;
//! the record itself is just the data. [`RecordRef`] is the shared-handle
//! form the session identity map deals in, so that a record materialized
//! from a query and later mutated through the handle is the same object the
//! session sees at commit time.

use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// A mapped object: a class tag plus named field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    class_name: String,
    values: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record of the given class.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            values: IndexMap::new(),
        }
    }

    /// The fully-qualified class name of this record.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Set a field value. Returns `&mut Self` for chaining.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Builder-style field assignment.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Get a field value, if set.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Resolve a field for evaluation: an unset field reads as `Null`.
    pub fn field_value(&self, field: &str) -> Value {
        self.values.get(field).cloned().unwrap_or(Value::Null)
    }

    /// Remove and return a field value.
    pub fn take(&mut self, field: &str) -> Option<Value> {
        self.values.shift_remove(field)
    }

    /// Iterate over the set fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of set fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no fields are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Wrap this record into a shared handle.
    pub fn into_ref(self) -> RecordRef {
        Arc::new(RwLock::new(self))
    }
}

/// Shared, mutable handle to a record.
///
/// The identity map hands these out so every holder of the same hashkey
/// observes the same underlying object within a session.
pub type RecordRef = Arc<RwLock<Record>>;

/// Clone the record out of a shared handle.
pub fn snapshot(record: &RecordRef) -> Record {
    record.read().expect("record lock poisoned").clone()
}
