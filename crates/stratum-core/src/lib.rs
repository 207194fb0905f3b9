//! Core types and traits for Stratum.
//!
//! This crate provides the foundational abstractions for object
//! persistence:
//!
//! - `Record` tagged field-map object representation with shared handles
//! - `Table` / `Catalog` storage metadata and class registry
//! - `Datatype` classification of scalar and relationship columns
//! - Content-addressed identity hashing (`hash_key` / `full_hash_key`)
//! - The query algebra (`Predicate`, `Select`, in-process evaluation)
//! - The `Backend` / `ConnectedBackend` storage contract

pub mod backend;
pub mod datatype;
pub mod error;
pub mod hashkey;
pub mod query;
pub mod record;
pub mod table;
pub mod value;

pub use backend::{Backend, ConnectedBackend, Objects, Rows};
pub use datatype::Datatype;
pub use error::{Error, Result};
pub use hashkey::{HashKey, full_hash_key, hash_key};
pub use query::{
    Comparator, Field, LimitClause, Operand, OrderByClause, Predicate, Select, and_, field, or_,
};
pub use record::{Record, RecordRef, snapshot};
pub use table::{Catalog, Column, Constructor, SharedCatalog, Table, TableBuilder};
pub use value::Value;
