//! The connection and session types.

use std::collections::HashMap;
use std::sync::Arc;
use stratum_core::{
    Backend, Catalog, ConnectedBackend, Error, HashKey, Objects, Record, RecordRef, Result,
    Select, SharedCatalog, Table, full_hash_key, hash_key, snapshot,
};

/// One tracked entry in the identity map: the shared record handle plus
/// the content hash observed when the entry was last registered clean.
/// `None` for the baseline forces a mismatch at the next commit.
#[derive(Clone)]
struct MapEntry {
    record: RecordRef,
    baseline: Option<HashKey>,
}

/// A binding of a storage backend to a table catalog.
///
/// Connections are cheap handles; sessions opened on the same connection
/// share its catalog and its backend instance.
#[derive(Clone)]
pub struct Connection {
    backend: Arc<dyn Backend>,
    catalog: SharedCatalog,
}

impl Connection {
    /// Bind a backend with an empty catalog.
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
            catalog: Arc::new(Catalog::new()),
        }
    }

    /// The shared catalog of this connection.
    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    /// Create the given tables on the backend and register them in the
    /// catalog. Uses a short-lived connected handle of its own.
    pub fn create_tables(&self, tables: impl IntoIterator<Item = Table>) -> Result<()> {
        let mut backend = self.backend.connect(Arc::clone(&self.catalog));
        for table in tables {
            backend.create_table(&table)?;
            self.catalog.register(table);
        }
        backend.commit()?;
        backend.disconnect()
    }

    /// Open a session. The backend connects lazily from the caller's point
    /// of view: connecting is part of opening the session scope.
    pub fn session(&self) -> Session {
        Session::open(self.backend.connect(Arc::clone(&self.catalog)), &self.catalog)
    }

    /// Run a closure inside a managed session scope.
    ///
    /// Commits on `Ok`, rolls back on `Err`, and disconnects on every exit
    /// path; the error path forces rollback before disconnect.
    pub fn with_session<T>(&self, f: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        let mut session = self.session();
        match f(&mut session) {
            Ok(value) => {
                session.commit()?;
                session.disconnect()?;
                Ok(value)
            }
            Err(error) => {
                session.rollback()?;
                session.disconnect()?;
                Err(error)
            }
        }
    }
}

/// A unit of work over one connected backend.
///
/// State machine: `Open → (reads/writes)* → {Commit | Rollback} →
/// Disconnected`. The scope is exited exactly once, either explicitly via
/// [`Session::close`] / [`Session::disconnect`] or through
/// [`Connection::with_session`]. A session dropped while still open rolls
/// back and disconnects.
pub struct Session {
    catalog: SharedCatalog,
    backend: Box<dyn ConnectedBackend>,
    live: HashMap<HashKey, MapEntry>,
    deleted: HashMap<HashKey, MapEntry>,
    /// Live-map snapshot as of session open / the last successful commit;
    /// rollback restores from here.
    committed: HashMap<HashKey, MapEntry>,
    open: bool,
}

impl Session {
    fn open(backend: Box<dyn ConnectedBackend>, catalog: &SharedCatalog) -> Self {
        Self {
            catalog: Arc::clone(catalog),
            backend,
            live: HashMap::new(),
            deleted: HashMap::new(),
            committed: HashMap::new(),
            open: true,
        }
    }

    /// The identity of a record under this session's catalog.
    pub fn hash_key(&self, record: &Record) -> Result<HashKey> {
        hash_key(&self.catalog, record)
    }

    /// Whether two records denote the same persistent object.
    pub fn same(&self, a: &Record, b: &Record) -> Result<bool> {
        Ok(hash_key(&self.catalog, a)? == hash_key(&self.catalog, b)?)
    }

    /// Register a known-new record and return its tracked handle.
    ///
    /// The entry is marked dirty: it will be persisted at the next commit
    /// even if its content never changes again.
    pub fn append(&mut self, record: Record) -> Result<RecordRef> {
        self.attach(record.into_ref(), true)
    }

    /// Register an existing handle. With `mark_dirty` the entry is forced
    /// to persist at the next commit; without it, a re-registration keeps
    /// the previously recorded baseline.
    pub fn add(&mut self, handle: RecordRef, mark_dirty: bool) -> Result<RecordRef> {
        self.attach(handle, mark_dirty)
    }

    fn attach(&mut self, handle: RecordRef, mark_dirty: bool) -> Result<RecordRef> {
        let record = snapshot(&handle);
        let key = hash_key(&self.catalog, &record)?;
        match self.live.get_mut(&key) {
            Some(entry) => {
                // overwrite the object reference, keep the baseline unless
                // explicitly marked dirty
                entry.record = Arc::clone(&handle);
                if mark_dirty {
                    entry.baseline = None;
                }
            }
            None => {
                let baseline = if mark_dirty {
                    None
                } else {
                    Some(full_hash_key(&self.catalog, &record)?)
                };
                self.live.insert(
                    key,
                    MapEntry {
                        record: Arc::clone(&handle),
                        baseline,
                    },
                );
            }
        }
        Ok(handle)
    }

    /// Remove a record from the live map and schedule its deletion.
    ///
    /// Works for records never registered here too: the deletion is keyed
    /// by identity, with a content-hash snapshot taken now.
    pub fn remove(&mut self, handle: &RecordRef) -> Result<()> {
        let record = snapshot(handle);
        let key = hash_key(&self.catalog, &record)?;
        let entry = match self.live.remove(&key) {
            Some(entry) => entry,
            None => MapEntry {
                record: Arc::clone(handle),
                baseline: Some(full_hash_key(&self.catalog, &record)?),
            },
        };
        self.deleted.insert(key, entry);
        Ok(())
    }

    /// Containment test: true if the handle itself, or any live entry with
    /// the same hashkey, is in the live map. An unmapped class is simply
    /// not a member, never an error.
    pub fn contains(&self, handle: &RecordRef) -> bool {
        if self.live.values().any(|e| Arc::ptr_eq(&e.record, handle)) {
            return true;
        }
        let record = snapshot(handle);
        match hash_key(&self.catalog, &record) {
            Ok(key) => self.live.contains_key(&key),
            Err(_) => false,
        }
    }

    /// Containment test by precomputed hashkey.
    pub fn contains_key(&self, key: HashKey) -> bool {
        self.live.contains_key(&key)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Check whether the live map is empty.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Iterate over the live record handles.
    pub fn iter(&self) -> impl Iterator<Item = RecordRef> + '_ {
        self.live.values().map(|e| Arc::clone(&e.record))
    }

    /// Fetch one object by identity.
    ///
    /// An identity-map hit returns the cached handle without touching the
    /// backend; a miss delegates to the backend's point lookup and folds
    /// the result into the map as clean.
    pub fn get(&mut self, class_name: &str, key: HashKey) -> Result<Option<RecordRef>> {
        self.ensure_open()?;
        if let Some(entry) = self.live.get(&key) {
            return Ok(Some(Arc::clone(&entry.record)));
        }
        let table = self.catalog.get(class_name)?;
        match self.backend.get(&table, key)? {
            Some(record) => Ok(Some(self.attach(record.into_ref(), false)?)),
            None => Ok(None),
        }
    }

    /// Run a query and fold every result into the identity map as
    /// **clean**: a freshly queried record only persists again once its
    /// content actually changes (or it is re-registered dirty).
    pub fn query(&mut self, select: &Select) -> Result<Vec<RecordRef>> {
        self.ensure_open()?;
        let rows = self.backend.query(select)?;
        let mut handles = Vec::new();
        for row in rows {
            handles.push(self.attach(row?.into_ref(), false)?);
        }
        Ok(handles)
    }

    /// Run a query and return the first result, if any. Pulls at most one
    /// row from the backend.
    pub fn query_one(&mut self, select: &Select) -> Result<Option<RecordRef>> {
        self.ensure_open()?;
        let mut rows = self.backend.query(select)?;
        match rows.next() {
            Some(row) => Ok(Some(self.attach(row?.into_ref(), false)?)),
            None => Ok(None),
        }
    }

    /// Register a table on the backend and in the shared catalog.
    pub fn create_table(&mut self, table: Table) -> Result<()> {
        self.ensure_open()?;
        self.backend.create_table(&table)?;
        self.catalog.register(table);
        Ok(())
    }

    /// Persist the unit of work.
    ///
    /// Every live entry whose current content hash differs from its
    /// baseline is staged as a backend insert; pending deletions go out as
    /// one flattened backend delete; then the backend commits (applying
    /// inserts before deletes). On success, baselines refresh and the
    /// committed snapshot advances.
    ///
    /// Best effort: if the backend fails partway there is no
    /// partial-commit recovery; the error surfaces as-is.
    pub fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        tracing::debug!(live = self.live.len(), deleted = self.deleted.len(), "commit");

        let mut current_hashes: HashMap<HashKey, HashKey> = HashMap::new();
        for (key, entry) in &self.live {
            let record = snapshot(&entry.record);
            let current = full_hash_key(&self.catalog, &record)?;
            current_hashes.insert(*key, current);
            if entry.baseline != Some(current) {
                self.backend.insert(Objects::One(Arc::clone(&entry.record)))?;
            }
        }

        if !self.deleted.is_empty() {
            let objs: Objects = self
                .deleted
                .values()
                .map(|entry| Objects::One(Arc::clone(&entry.record)))
                .collect();
            self.backend.delete(objs)?;
        }

        self.backend.commit()?;

        for (key, entry) in &mut self.live {
            entry.baseline = current_hashes.get(key).copied();
        }
        self.deleted.clear();
        self.committed = self.live.clone();
        Ok(())
    }

    /// Abandon the unit of work.
    ///
    /// Rolls back the backend's staged writes, restores the live map from
    /// the last committed snapshot, and merges the pending-deletion
    /// entries back in as live. A rollback undoes deletes and drops
    /// uncommitted appends, but never un-inserts already-committed state.
    pub fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        tracing::debug!("rollback");
        self.backend.rollback()?;
        let mut restored = self.committed.clone();
        for (key, entry) in self.deleted.drain() {
            restored.insert(key, entry);
        }
        self.live = restored;
        Ok(())
    }

    /// Release the backend connection. Idempotent; reads and writes after
    /// this fail.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.backend.disconnect()?;
        }
        Ok(())
    }

    /// Explicitly end the session scope without committing.
    pub fn close(mut self) -> Result<()> {
        self.disconnect()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(Error::backend("session is disconnected"))
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // abandoned scope: force rollback before releasing the connection
        if self.open {
            let _ = self.backend.rollback();
            self.open = false;
            let _ = self.backend.disconnect();
        }
    }
}
