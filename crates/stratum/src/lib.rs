//! Stratum: object persistence for Rust.
//!
//! Stratum maps in-memory records to rows in pluggable storage backends,
//! tracks object identity and mutation within a unit-of-work session, and
//! translates a small query algebra into backend-specific execution (an
//! in-process scan over the memory backend, generated SQL over the SQL
//! backend) with identical observable semantics.
//!
//! # Quick start
//!
//! ```ignore
//! use stratum::{Connection, Datatype, MemoryBackend, Record, Select, Table, field};
//!
//! let connection = Connection::new(MemoryBackend::new());
//! connection.create_tables([Table::builder("app.Person", "person")
//!     .column("name", Datatype::Text)
//!     .column("age", Datatype::Integer)
//!     .primary_key(["name"])
//!     .build()])?;
//!
//! connection.with_session(|session| {
//!     session.append(Record::new("app.Person").with("name", "ada").with("age", 36))?;
//!     Ok(())
//! })?;
//!
//! connection.with_session(|session| {
//!     let hits = session.query(&Select::new("app.Person").where_(field("age").gt(30)))?;
//!     assert_eq!(hits.len(), 1);
//!     Ok(())
//! })?;
//! ```

pub use stratum_core::{
    Backend, Catalog, Column, Comparator, ConnectedBackend, Constructor, Datatype, Error, Field,
    HashKey, LimitClause, Objects, Operand, OrderByClause, Predicate, Record, RecordRef, Result,
    Rows, Select, SharedCatalog, Table, TableBuilder, Value, and_, field, full_hash_key, hash_key,
    or_, snapshot,
};
pub use stratum_memory::{MemoryBackend, MemoryConnectedBackend};
pub use stratum_session::{Connection, Session};
pub use stratum_sql::{RowCodec, SqlBackend, SqlConnectedBackend, SqlExecutor, SqlRow, StandardCodec};
