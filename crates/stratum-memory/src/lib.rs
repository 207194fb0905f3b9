//! Reference in-memory storage backend.
//!
//! [`MemoryBackend`] keeps every committed record in a process-local keyed
//! store shared by all connections to the same backend instance: the
//! shared store simulates a database, the per-connection staged writes
//! simulate transaction isolation. Nothing persists across process
//! lifetime by design.
//!
//! The query path executes the predicate model directly over the committed
//! store and is the semantics other backends are measured against.
//!
//! # Concurrency
//!
//! The shared store sits behind a mutex so that concurrent commits from
//! separate connections serialize instead of racing, but staging itself is
//! single-writer per connection: no isolation is provided between
//! concurrent stagings against the same committed store.

mod rows;

use parking_lot::Mutex;
use rows::MemoryRows;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stratum_core::{
    Backend, ConnectedBackend, Error, HashKey, Objects, Record, Result, Rows, Select,
    SharedCatalog, Table, hash_key, snapshot,
};

/// The committed side of the store, shared by every connection to one
/// backend instance.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    /// Storage names of tables created on this backend.
    tables: HashSet<String>,
    /// Committed records keyed by hashkey.
    committed: HashMap<HashKey, Record>,
}

/// A process-local storage backend.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    store: Arc<Mutex<MemoryStore>>,
}

impl MemoryBackend {
    /// Create an empty backend instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed records, across all tables.
    pub fn committed_count(&self) -> usize {
        self.store.lock().committed.len()
    }
}

impl Backend for MemoryBackend {
    fn connect(&self, catalog: SharedCatalog) -> Box<dyn ConnectedBackend> {
        Box::new(MemoryConnectedBackend {
            store: Arc::clone(&self.store),
            catalog,
            staged: Arc::new(Mutex::new(HashMap::new())),
            staged_deletes: HashSet::new(),
        })
    }
}

/// One connection's live handle onto a [`MemoryBackend`].
pub struct MemoryConnectedBackend {
    store: Arc<Mutex<MemoryStore>>,
    catalog: SharedCatalog,
    /// Staged inserts. Shared with outstanding query cursors, which
    /// re-stage every record they yield (see [`ConnectedBackend::query`]).
    staged: Arc<Mutex<HashMap<HashKey, Record>>>,
    staged_deletes: HashSet<HashKey>,
}

impl MemoryConnectedBackend {
    /// Number of records currently staged for insertion.
    pub fn pending_inserts(&self) -> usize {
        self.staged.lock().len()
    }

    /// Number of keys currently staged for deletion.
    pub fn pending_deletes(&self) -> usize {
        self.staged_deletes.len()
    }
}

impl ConnectedBackend for MemoryConnectedBackend {
    fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    fn create_table(&mut self, table: &Table) -> Result<()> {
        tracing::debug!(table = table.name(), "CREATE TABLE");
        self.store.lock().tables.insert(table.name().to_string());
        Ok(())
    }

    fn insert(&mut self, objs: Objects) -> Result<()> {
        for handle in objs.flatten() {
            let record = snapshot(&handle);
            let key = hash_key(&self.catalog, &record)?;
            tracing::debug!(%key, class = record.class_name(), "INSERT");
            self.staged.lock().insert(key, record);
        }
        Ok(())
    }

    fn delete(&mut self, objs: Objects) -> Result<()> {
        for handle in objs.flatten() {
            let record = snapshot(&handle);
            let key = hash_key(&self.catalog, &record)?;
            tracing::debug!(%key, class = record.class_name(), "DELETE");
            self.staged.lock().remove(&key);
            self.staged_deletes.insert(key);
        }
        Ok(())
    }

    fn get(&mut self, _table: &Table, key: HashKey) -> Result<Option<Record>> {
        tracing::debug!(%key, "GET");
        Ok(self.store.lock().committed.get(&key).cloned())
    }

    /// Scan the committed store for records of the select's class.
    ///
    /// Each yielded record is also re-staged into this connection's
    /// staged-insert map: pulling a result marks the record "seen", tying
    /// the query to a later commit.
    fn query(&mut self, select: &Select) -> Result<Rows> {
        tracing::debug!(class = select.class_name(), "SELECT");
        let table = self.catalog.get(select.class_name())?;

        let store = self.store.lock();
        if !store.tables.contains(table.name()) {
            return Err(Error::table_does_not_exist(table.name()));
        }
        let candidates: Vec<Record> = store
            .committed
            .values()
            .filter(|record| record.class_name() == select.class_name())
            .cloned()
            .collect();
        drop(store);

        Ok(Rows::new(MemoryRows::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.staged),
            select.clone(),
            candidates,
        )))
    }

    fn commit(&mut self) -> Result<()> {
        tracing::debug!("COMMIT");
        let mut store = self.store.lock();
        for (key, record) in self.staged.lock().drain() {
            store.committed.insert(key, record);
        }
        // deletes apply after inserts: a delete of a just-inserted key wins
        for key in self.staged_deletes.drain() {
            store.committed.remove(&key);
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        tracing::debug!("ROLLBACK");
        self.staged.lock().clear();
        self.staged_deletes.clear();
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }
}
