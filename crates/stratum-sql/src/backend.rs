//! The generic SQL storage backend.
//!
//! Wire access to an actual SQL engine stays outside this crate: a
//! [`SqlExecutor`] is the engine-supplied collaborator that runs statements
//! inside one open transaction per connection. [`SqlBackend`] implements
//! the storage contract generically over it: writes execute immediately
//! against the executor and stay staged inside its transaction until
//! commit, exactly like the engine's own transaction semantics.

use crate::codec::{RowCodec, StandardCodec, decode_row};
use crate::statement;
use std::sync::Arc;
use stratum_core::{
    Backend, ConnectedBackend, Error, HashKey, Objects, Record, Result, Rows, Select,
    SharedCatalog, Table, hash_key, snapshot,
};

/// One result row from the executor: column name, stored value.
pub type SqlRow = Vec<(String, stratum_core::Value)>;

/// Engine-supplied statement runner, scoped to one connection.
///
/// Implementations hold one open transaction: statements run inside it,
/// `commit` / `rollback` end it and open the next.
pub trait SqlExecutor: Send {
    /// Run a statement with no result rows.
    fn execute(&mut self, sql: &str, params: &[stratum_core::Value]) -> Result<()>;

    /// Run a statement and return its result rows.
    fn query(&mut self, sql: &str, params: &[stratum_core::Value]) -> Result<Vec<SqlRow>>;

    /// Durably apply the open transaction.
    fn commit(&mut self) -> Result<()>;

    /// Discard the open transaction.
    fn rollback(&mut self) -> Result<()>;

    /// Release the underlying connection.
    fn close(&mut self) -> Result<()>;
}

/// A SQL storage backend generic over its executor.
pub struct SqlBackend<E: SqlExecutor> {
    opener: Arc<dyn Fn() -> E + Send + Sync>,
    codec: Arc<dyn RowCodec>,
}

impl<E: SqlExecutor> SqlBackend<E> {
    /// Create a backend that opens one executor per connection.
    pub fn new(opener: impl Fn() -> E + Send + Sync + 'static) -> Self {
        Self {
            opener: Arc::new(opener),
            codec: Arc::new(StandardCodec),
        }
    }

    /// Replace the row codec.
    #[must_use]
    pub fn with_codec(mut self, codec: impl RowCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }
}

impl<E: SqlExecutor + 'static> Backend for SqlBackend<E> {
    fn connect(&self, catalog: SharedCatalog) -> Box<dyn ConnectedBackend> {
        Box::new(SqlConnectedBackend {
            executor: (self.opener)(),
            catalog,
            codec: Arc::clone(&self.codec),
            closed: false,
        })
    }
}

/// One connection's live handle onto a [`SqlBackend`].
pub struct SqlConnectedBackend<E: SqlExecutor> {
    executor: E,
    catalog: SharedCatalog,
    codec: Arc<dyn RowCodec>,
    closed: bool,
}

impl<E: SqlExecutor> SqlConnectedBackend<E> {
    fn encode_columns(&self, table: &Table, record: &Record) -> Result<Vec<stratum_core::Value>> {
        table
            .columns()
            .values()
            .map(|column| {
                self.codec
                    .encode(&self.catalog, column, &record.field_value(&column.name))
            })
            .collect()
    }
}

impl<E: SqlExecutor> ConnectedBackend for SqlConnectedBackend<E> {
    fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    fn create_table(&mut self, table: &Table) -> Result<()> {
        let stmt = statement::create_table(table);
        tracing::debug!(sql = %stmt.sql, "CREATE TABLE");
        self.executor.execute(&stmt.sql, &stmt.params)
    }

    fn insert(&mut self, objs: Objects) -> Result<()> {
        for handle in objs.flatten() {
            let record = snapshot(&handle);
            let table = self.catalog.table_for(&record)?;
            let key = hash_key(&self.catalog, &record)?;
            let encoded = self.encode_columns(&table, &record)?;
            let stmt = statement::insert(&table, key, encoded);
            tracing::debug!(sql = %stmt.sql, %key, "INSERT");
            self.executor.execute(&stmt.sql, &stmt.params)?;
        }
        Ok(())
    }

    fn delete(&mut self, objs: Objects) -> Result<()> {
        for handle in objs.flatten() {
            let record = snapshot(&handle);
            let table = self.catalog.table_for(&record)?;
            let key = hash_key(&self.catalog, &record)?;
            let stmt = statement::delete(&table, key);
            tracing::debug!(sql = %stmt.sql, %key, "DELETE");
            self.executor.execute(&stmt.sql, &stmt.params)?;
        }
        Ok(())
    }

    fn get(&mut self, table: &Table, key: HashKey) -> Result<Option<Record>> {
        let stmt = statement::get(table, key);
        tracing::debug!(sql = %stmt.sql, %key, "GET");
        let mut rows = self.executor.query(&stmt.sql, &stmt.params)?;
        match rows.drain(..).next() {
            Some(row) => {
                let record = decode_row(self.codec.as_ref(), table, &row, table.new_record())?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn query(&mut self, select: &Select) -> Result<Rows> {
        let table = self.catalog.get(select.class_name())?;
        let stmt = statement::select(&table, select)?;
        tracing::debug!(sql = %stmt.sql, "SELECT");

        // a failed select means the table was never created on this engine
        let rows = self
            .executor
            .query(&stmt.sql, &stmt.params)
            .map_err(|source| {
                tracing::debug!(error = %source, "SELECT failed");
                Error::table_does_not_exist(table.name())
            })?;

        let codec = Arc::clone(&self.codec);
        let constructor = select.constructor();
        Ok(Rows::new(rows.into_iter().map(move |row| {
            let base = match constructor {
                Some(build) => build(&table),
                None => table.new_record(),
            };
            decode_row(codec.as_ref(), &table, &row, base)
        })))
    }

    fn commit(&mut self) -> Result<()> {
        tracing::debug!("COMMIT");
        self.executor.commit()
    }

    fn rollback(&mut self) -> Result<()> {
        tracing::debug!("ROLLBACK");
        self.executor.rollback()
    }

    fn disconnect(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.executor.close()?;
        }
        Ok(())
    }
}
