//! Session and unit of work for Stratum.
//!
//! The session is the **unit-of-work layer**: it mediates all object
//! traffic between application code and a connected backend through an
//! identity map, tracks mutation by content hash, and owns the
//! commit/rollback protocol.
//!
//! # Role in the architecture
//!
//! - **Identity map**: one live record handle per hashkey during a unit of
//!   work.
//! - **Dirty tracking**: every entry carries the content hash observed at
//!   registration; commit re-persists entries whose current content hash
//!   differs.
//! - **Transactional safety**: commit stages inserts before deletes and
//!   delegates final apply order to the backend; rollback restores the
//!   live map from the last committed snapshot and undoes pending deletes.
//!
//! # Example
//!
//! ```ignore
//! let connection = Connection::new(MemoryBackend::new());
//! connection.create_tables([person_table()])?;
//!
//! connection.with_session(|session| {
//!     session.append(Record::new("app.Person").with("name", "ada"))?;
//!     Ok(())
//! })?;
//!
//! connection.with_session(|session| {
//!     let found = session.query_one(&Select::new("app.Person"))?;
//!     Ok(())
//! })?;
//! ```

mod session;

pub use session::{Connection, Session};
