//! Error types for Stratum operations.

use std::fmt;

/// The primary error type for all Stratum operations.
#[derive(Debug)]
pub enum Error {
    /// The object's class has no registered table in the catalog.
    ///
    /// Raised by hashkey computation and table lookup. Callers at the
    /// session boundary propagate it, except for containment checks,
    /// which treat it as "not a member".
    NotMapped {
        /// The unregistered class name.
        class_name: String,
    },

    /// A query, get, insert, or delete targeted a table name that was
    /// never created on the backend it ran against.
    ///
    /// Always fatal to the calling operation, never silently swallowed.
    TableDoesNotExist {
        /// The missing table name.
        table: String,
    },

    /// An object passed for hashing belongs to a different runtime class
    /// than the table it is being hashed against. Programmer error.
    InvalidValue {
        /// Description of the mismatch.
        message: String,
    },

    /// An unknown comparator symbol was given to the comparison shorthand,
    /// or an evaluator met a predicate it cannot interpret.
    UnsupportedComparator {
        /// The offending symbol.
        symbol: String,
    },

    /// A storage- or executor-level failure carried through unchanged.
    Backend {
        /// Backend-supplied description.
        message: String,
    },
}

impl Error {
    /// Construct a [`Error::NotMapped`] for a class name.
    pub fn not_mapped(class_name: impl Into<String>) -> Self {
        Error::NotMapped {
            class_name: class_name.into(),
        }
    }

    /// Construct a [`Error::TableDoesNotExist`] for a table name.
    pub fn table_does_not_exist(table: impl Into<String>) -> Self {
        Error::TableDoesNotExist {
            table: table.into(),
        }
    }

    /// Construct a [`Error::InvalidValue`] with a message.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Error::InvalidValue {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Backend`] with a message.
    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend {
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotMapped { class_name } => {
                write!(f, "class '{class_name}' has no registered table")
            }
            Error::TableDoesNotExist { table } => {
                write!(f, "table '{table}' does not exist on this backend")
            }
            Error::InvalidValue { message } => write!(f, "invalid value: {message}"),
            Error::UnsupportedComparator { symbol } => {
                write!(f, "unsupported comparator '{symbol}'")
            }
            Error::Backend { message } => write!(f, "backend error: {message}"),
        }
    }
}

impl std::error::Error for Error {}

/// Convenience result type used throughout Stratum.
pub type Result<T> = std::result::Result<T, Error>;
