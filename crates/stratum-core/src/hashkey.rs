//! Content-addressed object identity.
//!
//! Every mapped record has a derived, deterministic identity: a digest of
//! its class name and its primary-key field values, reduced to a
//! fixed-width decimal number. Two records of the same class with equal
//! key fields share a hashkey regardless of where they live in memory.
//!
//! Relationship fields participate by identity, not by content: an embedded
//! referenced record folds in *its own* hashkey, so a referrer's identity
//! is stable under changes to the referee's non-key fields, and identity is
//! content-addressable across relationship graphs without materializing the
//! referenced rows. A storage-materialized reference (`Value::Ref`) is the
//! already-collapsed hashkey and folds in directly.
//!
//! Callers must not assume collision freedom at astronomic object counts;
//! the truncated digest gives a low collision probability for realistic
//! table sizes only.

use crate::error::{Error, Result};
use crate::record::Record;
use crate::table::{Catalog, Table};
use crate::value::Value;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Sentinel folded into the digest for an absent value. Distinct from every
/// real value's contribution, including the empty string.
const NULL_SENTINEL: &[u8] = b"_stratum_none";

/// Width, in decimal digits, of the reduced identity.
const KEY_DIGITS: usize = 18;

/// Derived identity of a mapped record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct HashKey(u64);

impl HashKey {
    /// Wrap a raw key value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric form.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for HashKey {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Compute a record's identity from its table's primary-key fields.
///
/// # Errors
///
/// [`Error::NotMapped`] if the record's class has no table in the catalog.
pub fn hash_key(catalog: &Catalog, record: &Record) -> Result<HashKey> {
    let table = catalog.table_for(record)?;
    let fields: Vec<&str> = table.primary_key().iter().map(String::as_str).collect();
    hash_fields(catalog, record, &table, &fields)
}

/// Compute a record's content hash from *all* of its table's columns.
///
/// Used for equality and dirty checks, never for identity.
pub fn full_hash_key(catalog: &Catalog, record: &Record) -> Result<HashKey> {
    let table = catalog.table_for(record)?;
    let fields: Vec<&str> = table.columns().keys().map(String::as_str).collect();
    hash_fields(catalog, record, &table, &fields)
}

/// Fold the named fields of `record` into a digest, in the given order.
///
/// # Errors
///
/// [`Error::InvalidValue`] if the record's class differs from the table it
/// is being hashed against.
pub fn hash_fields(
    catalog: &Catalog,
    record: &Record,
    table: &Table,
    fields: &[&str],
) -> Result<HashKey> {
    if record.class_name() != table.class_name() {
        return Err(Error::invalid_value(format!(
            "value is not of table's class: {} != {}",
            record.class_name(),
            table.class_name()
        )));
    }

    let mut digest = Sha256::new();
    digest.update(table.class_name().as_bytes());
    for field in fields {
        fold_value(&mut digest, catalog, &record.field_value(field))?;
    }
    let out = digest.finalize();
    Ok(reduce(out.as_slice()))
}

fn fold_value(digest: &mut Sha256, catalog: &Catalog, value: &Value) -> Result<()> {
    match value {
        Value::Record(inner) if catalog.contains(inner.class_name()) => {
            digest.update(hash_key(catalog, inner)?.to_string().as_bytes());
        }
        Value::Ref(key) => digest.update(key.to_string().as_bytes()),
        Value::Collection(items) => {
            for item in items {
                if catalog.contains(item.class_name()) {
                    digest.update(hash_key(catalog, item)?.to_string().as_bytes());
                } else {
                    digest.update(Value::Record(Box::new(item.clone())).literal_text().as_bytes());
                }
            }
        }
        Value::Null => digest.update(NULL_SENTINEL),
        other => digest.update(other.literal_text().as_bytes()),
    }
    Ok(())
}

/// Reduce a digest to the canonical-width decimal identity: interpret the
/// bytes as a big-endian unsigned integer and keep the leading decimal
/// digits.
fn reduce(digest: &[u8]) -> HashKey {
    let decimal = BigUint::from_bytes_be(digest).to_string();
    let end = decimal.len().min(KEY_DIGITS);
    let raw: u64 = decimal[..end].parse().expect("decimal digits fit in u64");
    HashKey(raw)
}
