//! SQL translation layer for Stratum.
//!
//! Compiles the query algebra to parameterized SQL, converts field values
//! to and from storage form, and implements the storage contract
//! generically over an engine-supplied [`SqlExecutor`]. The same predicate
//! tree drives both this translation and the in-memory evaluator, which is
//! what keeps the two backends observably identical.

pub mod backend;
pub mod codec;
pub mod statement;

pub use backend::{SqlBackend, SqlConnectedBackend, SqlExecutor, SqlRow};
pub use codec::{RowCodec, StandardCodec, decode_row};
pub use statement::{HASHKEY_COLUMN, Statement, create_table, delete, get, insert, select, storage_type};
