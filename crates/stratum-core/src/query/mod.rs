//! The query algebra: predicate trees, the Select descriptor, and the
//! in-process evaluation semantics every backend must reproduce.

pub mod eval;
pub mod predicate;
pub mod select;

pub use eval::{evaluate, matches};
pub use predicate::{Comparator, Field, Operand, Predicate, and_, field, or_};
pub use select::{LimitClause, OrderByClause, Select};
