//! The query descriptor.
//!
//! A [`Select`] names a target class and carries an optional predicate,
//! ordering clauses, and a half-open limit window. It is an immutable value
//! built through a fluent API; one instance is consumed by exactly one
//! backend query call.

use crate::error::Result;
use crate::query::predicate::{Comparator, Operand, Predicate};
use crate::table::Constructor;

/// One ordering clause. Clauses are independent and applied in declared
/// order: the first clause is the primary sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByClause {
    /// Field to sort by.
    pub field: String,
    /// Ascending when true.
    pub ascending: bool,
}

impl OrderByClause {
    /// An ascending clause.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    /// A descending clause.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// A half-open window over the post-filter result sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitClause {
    /// First index to yield.
    pub start: usize,
    /// One past the last index to yield; `None` means unbounded.
    pub end: Option<usize>,
}

impl LimitClause {
    /// Check whether a post-filter position falls inside the window.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && self.end.is_none_or(|end| index < end)
    }
}

/// A query descriptor for one mapped class.
#[derive(Debug, Clone)]
pub struct Select {
    class_name: String,
    constructor: Option<Constructor>,
    predicate: Option<Predicate>,
    order_by: Vec<OrderByClause>,
    limit: Option<LimitClause>,
}

impl Select {
    /// Start a query against `class_name`.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            constructor: None,
            predicate: None,
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Override the record constructor used on materialization.
    #[must_use]
    pub fn constructed_with(mut self, build: Constructor) -> Self {
        self.constructor = Some(build);
        self
    }

    /// Set the predicate from a prebuilt tree, replacing any prior one.
    #[must_use]
    pub fn where_(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Three-argument comparison shorthand with a comparator symbol.
    ///
    /// # Errors
    ///
    /// [`crate::Error::UnsupportedComparator`] for an unknown symbol.
    pub fn where_cmp(
        self,
        lhs: impl Into<Operand>,
        symbol: &str,
        rhs: impl Into<Operand>,
    ) -> Result<Self> {
        let op = Comparator::parse(symbol)?;
        Ok(self.where_(Predicate::compare(lhs, op, rhs)))
    }

    /// Boolean shorthand: `true` always matches, `false` never matches.
    #[must_use]
    pub fn where_bool(self, matches: bool) -> Self {
        self.where_(if matches {
            Predicate::always()
        } else {
            Predicate::never()
        })
    }

    /// Append an ascending ordering clause.
    #[must_use]
    pub fn orderby(mut self, field: impl Into<String>) -> Self {
        self.order_by.push(OrderByClause::asc(field));
        self
    }

    /// Append a descending ordering clause.
    #[must_use]
    pub fn orderby_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by.push(OrderByClause::desc(field));
        self
    }

    /// Append a prebuilt ordering clause.
    #[must_use]
    pub fn orderby_clause(mut self, clause: OrderByClause) -> Self {
        self.order_by.push(clause);
        self
    }

    /// Set the half-open `[start, end)` window over the post-filter
    /// sequence. `None` for `end` leaves it unbounded.
    #[must_use]
    pub fn slice(mut self, start: usize, end: Option<usize>) -> Self {
        self.limit = Some(LimitClause { start, end });
        self
    }

    /// The target class name.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The materialization override, if any.
    pub fn constructor(&self) -> Option<Constructor> {
        self.constructor
    }

    /// The predicate, if any. `None` matches everything.
    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// The ordering clauses in declared order.
    pub fn order_by(&self) -> &[OrderByClause] {
        &self.order_by
    }

    /// The limit window, if any.
    pub fn limit(&self) -> Option<LimitClause> {
        self.limit
    }
}
