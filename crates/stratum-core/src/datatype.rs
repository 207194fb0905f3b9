//! Column datatype classification.
//!
//! The core consumes datatypes as given facts: it only needs to tell
//! foreign-key scalar references, foreign-key collection references, and
//! plain scalars apart, so that identity hashing and backend
//! materialization can special-case relationship fields. Storage mapping
//! of scalars is the storage layer's concern.

use serde::{Deserialize, Serialize};

/// The declared datatype of a mapped column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Datatype {
    /// Boolean flag
    Boolean,

    /// 64-bit integer
    Integer,

    /// Fixed-precision number
    Number {
        /// Total digits
        length: u8,
        /// Digits after the decimal point
        decimals: u8,
    },

    /// Short text
    Text,

    /// Unbounded text
    LongText,

    /// Timestamp (microseconds since epoch)
    Timestamp,

    /// Enumeration over a fixed variant list; stored as the variant index
    Enum {
        /// Variant names in declaration order.
        variants: Vec<String>,
    },

    /// Opaque serialized object payload
    Opaque,

    /// One-to-one reference to another mapped class
    One {
        /// The referenced class name.
        class_name: String,
        /// Fetch the referenced row eagerly on materialization.
        autofetch: bool,
        /// Field on the referenced class pointing back at this one.
        inverse: Option<String>,
    },

    /// One-to-many reference to another mapped class
    Many {
        /// The referenced class name.
        class_name: String,
        /// Fetch the referenced rows eagerly on materialization.
        autofetch: bool,
        /// Field on the referenced class pointing back at this one.
        inverse: Option<String>,
    },
}

impl Datatype {
    /// Shorthand for a plain one-to-one reference.
    pub fn one(class_name: impl Into<String>) -> Self {
        Datatype::One {
            class_name: class_name.into(),
            autofetch: false,
            inverse: None,
        }
    }

    /// Shorthand for a plain one-to-many reference.
    pub fn many(class_name: impl Into<String>) -> Self {
        Datatype::Many {
            class_name: class_name.into(),
            autofetch: false,
            inverse: None,
        }
    }

    /// Shorthand for an enumeration datatype.
    pub fn enumeration<S: Into<String>>(variants: impl IntoIterator<Item = S>) -> Self {
        Datatype::Enum {
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// True for a foreign-key scalar reference (`One`).
    pub const fn is_reference(&self) -> bool {
        matches!(self, Datatype::One { .. })
    }

    /// True for a foreign-key collection reference (`Many`).
    pub const fn is_collection(&self) -> bool {
        matches!(self, Datatype::Many { .. })
    }

    /// True for anything that is not a relationship field.
    pub const fn is_scalar(&self) -> bool {
        !self.is_reference() && !self.is_collection()
    }

    /// The referenced class name, for relationship datatypes.
    pub fn referenced_class(&self) -> Option<&str> {
        match self {
            Datatype::One { class_name, .. } | Datatype::Many { class_name, .. } => {
                Some(class_name)
            }
            _ => None,
        }
    }
}
