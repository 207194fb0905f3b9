//! Storage backend contract.
//!
//! A [`Backend`] is a storage engine a connection can bind to; a
//! [`ConnectedBackend`] is the live, session-bound handle implementing the
//! storage operations. The contract is identical for every backend
//! (staged writes until commit, delete-after-insert apply order,
//! observable table registration), while the traversal and storage
//! strategy is each backend's own. The shared hashing logic rides on the
//! contract as provided methods so every backend keys objects identically.

use crate::error::Result;
use crate::hashkey::{self, HashKey};
use crate::query::Select;
use crate::record::{Record, RecordRef};
use crate::table::{SharedCatalog, Table};

/// An arbitrarily nested group of records handed to `insert` / `delete`.
///
/// The contract flattens the tree into a flat object stream before keying
/// each record by its hashkey, so `insert(a, [b, [c, d]])`-style calls
/// stage exactly four independently-keyed objects.
#[derive(Debug, Clone)]
pub enum Objects {
    /// A single record handle.
    One(RecordRef),
    /// A nested group.
    Many(Vec<Objects>),
}

impl Objects {
    /// An empty group.
    pub fn none() -> Self {
        Objects::Many(Vec::new())
    }

    /// Flatten into a single stream of record handles.
    pub fn flatten(self) -> Vec<RecordRef> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<RecordRef>) {
        match self {
            Objects::One(record) => out.push(record),
            Objects::Many(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

impl From<RecordRef> for Objects {
    fn from(record: RecordRef) -> Self {
        Objects::One(record)
    }
}

impl From<Record> for Objects {
    fn from(record: Record) -> Self {
        Objects::One(record.into_ref())
    }
}

impl From<Vec<RecordRef>> for Objects {
    fn from(records: Vec<RecordRef>) -> Self {
        Objects::Many(records.into_iter().map(Objects::One).collect())
    }
}

impl FromIterator<Objects> for Objects {
    fn from_iter<I: IntoIterator<Item = Objects>>(iter: I) -> Self {
        Objects::Many(iter.into_iter().collect())
    }
}

/// A lazy, finite, one-shot stream of query results.
///
/// Not restartable: once drained it stays drained. Evaluation is pull
/// driven, with each `next` performing the scan/filter work for one
/// element, and cancellation is simply ceasing to pull.
pub struct Rows {
    inner: Box<dyn Iterator<Item = Result<Record>>>,
}

impl Rows {
    /// Wrap an iterator of materialized records.
    pub fn new(inner: impl Iterator<Item = Result<Record>> + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    /// A stream with no rows.
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }
}

impl Iterator for Rows {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl std::fmt::Debug for Rows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Rows(..)")
    }
}

/// A storage engine a connection can bind to.
pub trait Backend: Send + Sync {
    /// Open a live handle bound to the given catalog.
    fn connect(&self, catalog: SharedCatalog) -> Box<dyn ConnectedBackend>;
}

/// The live, session-bound handle to a storage backend.
///
/// All writes stage until [`commit`](ConnectedBackend::commit); commit
/// applies staged inserts first and staged deletes second, so a delete of a
/// just-inserted key wins. [`rollback`](ConnectedBackend::rollback)
/// discards staged writes and leaves committed state alone.
pub trait ConnectedBackend {
    /// The catalog this handle resolves class names against.
    fn catalog(&self) -> &SharedCatalog;

    /// Register a table's schema on this backend.
    ///
    /// Idempotent at the metadata level, and observable: a query against a
    /// table name never created here fails with
    /// [`crate::Error::TableDoesNotExist`].
    fn create_table(&mut self, table: &Table) -> Result<()>;

    /// Stage the flattened records for insertion, keyed by hashkey.
    fn insert(&mut self, objs: Objects) -> Result<()>;

    /// Stage the flattened records for deletion, keyed by hashkey.
    fn delete(&mut self, objs: Objects) -> Result<()>;

    /// Point lookup by hashkey against committed state. No predicate
    /// evaluation.
    fn get(&mut self, table: &Table, key: HashKey) -> Result<Option<Record>>;

    /// Execute a query descriptor.
    ///
    /// The returned stream honors predicate, ordering, and limit semantics
    /// identically to [`crate::query::eval`]. Backends may attach a
    /// documented write-back side effect to each pull.
    ///
    /// # Errors
    ///
    /// [`crate::Error::TableDoesNotExist`] if the target table was never
    /// created on this backend.
    fn query(&mut self, select: &Select) -> Result<Rows>;

    /// Durably apply staged inserts, then staged deletes.
    fn commit(&mut self) -> Result<()>;

    /// Discard all staged, uncommitted writes.
    fn rollback(&mut self) -> Result<()>;

    /// Release backend-held resources. Idempotent.
    fn disconnect(&mut self) -> Result<()>;

    /// Identity of a record under this handle's catalog.
    fn hash_key(&self, record: &Record) -> Result<HashKey> {
        hashkey::hash_key(self.catalog(), record)
    }

    /// Content hash of a record under this handle's catalog.
    fn full_hash_key(&self, record: &Record) -> Result<HashKey> {
        hashkey::full_hash_key(self.catalog(), record)
    }
}
