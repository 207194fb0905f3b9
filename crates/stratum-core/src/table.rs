//! Table metadata and the class-name catalog.
//!
//! A [`Table`] describes how one mapped class is stored: its storage name,
//! its columns in declaration order, which fields form the primary key, and
//! which fields are foreign keys. Tables are immutable once built. The
//! [`Catalog`] is the class-name registry a connection and its sessions
//! share; looking up an unregistered class raises [`Error::NotMapped`].

use crate::datatype::Datatype;
use crate::error::{Error, Result};
use crate::record::Record;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Materialization override: builds a fresh record for a table.
pub type Constructor = fn(&Table) -> Record;

/// A single mapped column.
#[derive(Debug, Clone)]
pub struct Column {
    /// The field name (also the storage column name).
    pub name: String,
    /// The declared datatype.
    pub datatype: Datatype,
}

/// Storage metadata for one mapped class.
#[derive(Debug, Clone)]
pub struct Table {
    class_name: String,
    name: String,
    columns: IndexMap<String, Column>,
    primary_key: Vec<String>,
    foreign_keys: HashSet<String>,
    constructor: Option<Constructor>,
}

impl Table {
    /// Start building a table for `class_name`, stored under `name`.
    pub fn builder(class_name: impl Into<String>, name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            class_name: class_name.into(),
            name: name.into(),
            columns: IndexMap::new(),
            primary_key: Vec::new(),
            constructor: None,
        }
    }

    /// The fully-qualified class name this table maps.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The storage-level table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &IndexMap<String, Column> {
        &self.columns
    }

    /// Look up one column by field name.
    pub fn column(&self, field: &str) -> Option<&Column> {
        self.columns.get(field)
    }

    /// Primary-key field names, in declared order.
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Field names holding relationship datatypes.
    pub fn foreign_keys(&self) -> &HashSet<String> {
        &self.foreign_keys
    }

    /// Build a fresh record for this table, honoring any registered
    /// constructor override.
    pub fn new_record(&self) -> Record {
        match self.constructor {
            Some(build) => build(self),
            None => Record::new(self.class_name.clone()),
        }
    }
}

/// Builder for [`Table`].
#[derive(Debug)]
pub struct TableBuilder {
    class_name: String,
    name: String,
    columns: IndexMap<String, Column>,
    primary_key: Vec<String>,
    constructor: Option<Constructor>,
}

impl TableBuilder {
    /// Declare a column. Declaration order is preserved and significant:
    /// identity hashing folds fields in this order.
    pub fn column(mut self, name: impl Into<String>, datatype: Datatype) -> Self {
        let name = name.into();
        self.columns.insert(
            name.clone(),
            Column {
                name,
                datatype,
            },
        );
        self
    }

    /// Declare the primary-key fields, in order.
    pub fn primary_key<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.primary_key = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Register a materialization override for this table.
    pub fn constructor(mut self, build: Constructor) -> Self {
        self.constructor = Some(build);
        self
    }

    /// Finish the table. Foreign keys are derived from the columns whose
    /// datatype is a reference or collection.
    pub fn build(self) -> Table {
        let foreign_keys = self
            .columns
            .values()
            .filter(|c| !c.datatype.is_scalar())
            .map(|c| c.name.clone())
            .collect();
        Table {
            class_name: self.class_name,
            name: self.name,
            columns: self.columns,
            primary_key: self.primary_key,
            foreign_keys,
            constructor: self.constructor,
        }
    }
}

/// The class-name → [`Table`] registry shared by a connection and every
/// session opened on it.
///
/// Registration happens through the connection's table-creation path;
/// lookups are read-mostly, so the registry sits behind an `RwLock`. Clones
/// of the returned tables are cheap and keep callers out of the lock.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: RwLock<IndexMap<String, Table>>,
}

/// Shared handle to a [`Catalog`].
pub type SharedCatalog = Arc<Catalog>;

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under its class name, replacing any prior entry.
    pub fn register(&self, table: Table) {
        tracing::debug!(
            class = table.class_name(),
            table = table.name(),
            "register table"
        );
        self.tables
            .write()
            .expect("catalog lock poisoned")
            .insert(table.class_name().to_string(), table);
    }

    /// Look up the table mapped for `class_name`.
    pub fn get(&self, class_name: &str) -> Result<Table> {
        self.tables
            .read()
            .expect("catalog lock poisoned")
            .get(class_name)
            .cloned()
            .ok_or_else(|| Error::not_mapped(class_name))
    }

    /// Look up the table for a record's class.
    pub fn table_for(&self, record: &Record) -> Result<Table> {
        self.get(record.class_name())
    }

    /// Check whether a class name is mapped.
    pub fn contains(&self, class_name: &str) -> bool {
        self.tables
            .read()
            .expect("catalog lock poisoned")
            .contains_key(class_name)
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.read().expect("catalog lock poisoned").len()
    }

    /// Check if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
