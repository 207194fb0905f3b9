//! Composable predicate trees.
//!
//! A predicate is an immutable tree of comparison and boolean-combinator
//! nodes, built through an explicit builder API: [`field`] produces a
//! column marker whose comparison methods each yield a [`Predicate::Compare`]
//! node, and [`Predicate::and`] / [`Predicate::or`] combine any two
//! subtrees. Comparisons commute: `field ? literal`, `literal ? field`, and
//! `field ? field` all produce correctly-oriented nodes because both
//! operands are explicit.

use crate::error::{Error, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// One side of a comparison: a field reference or a literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// Resolve against the candidate record by field name.
    Field(String),
    /// A literal value.
    Literal(Value),
}

impl Operand {
    /// A literal operand.
    pub fn literal(value: impl Into<Value>) -> Self {
        Operand::Literal(value.into())
    }
}

impl From<Field> for Operand {
    fn from(f: Field) -> Self {
        Operand::Field(f.name)
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Literal(v)
    }
}

impl From<&str> for Operand {
    fn from(v: &str) -> Self {
        Operand::Literal(v.into())
    }
}

impl From<String> for Operand {
    fn from(v: String) -> Self {
        Operand::Literal(v.into())
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Literal(v.into())
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Literal(v.into())
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Literal(v.into())
    }
}

impl From<bool> for Operand {
    fn from(v: bool) -> Self {
        Operand::Literal(v.into())
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
}

impl Comparator {
    /// The comparator's symbol, as accepted by [`Comparator::parse`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
        }
    }

    /// Parse a comparator symbol.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedComparator`] for any symbol outside the six
    /// supported ones.
    pub fn parse(symbol: &str) -> Result<Self> {
        match symbol {
            "=" | "==" => Ok(Comparator::Eq),
            "!=" => Ok(Comparator::Ne),
            ">" => Ok(Comparator::Gt),
            ">=" => Ok(Comparator::Ge),
            "<" => Ok(Comparator::Lt),
            "<=" => Ok(Comparator::Le),
            other => Err(Error::UnsupportedComparator {
                symbol: other.to_string(),
            }),
        }
    }
}

/// An immutable predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// A single comparison.
    Compare {
        /// Left operand.
        lhs: Operand,
        /// Comparison operator.
        op: Comparator,
        /// Right operand.
        rhs: Operand,
    },
    /// Both subtrees must match.
    And(Box<Predicate>, Box<Predicate>),
    /// Either subtree must match.
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Build a comparison node from explicit operands.
    pub fn compare(lhs: impl Into<Operand>, op: Comparator, rhs: impl Into<Operand>) -> Self {
        Predicate::Compare {
            lhs: lhs.into(),
            op,
            rhs: rhs.into(),
        }
    }

    /// Combine with another predicate under AND.
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    /// Combine with another predicate under OR.
    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// The always-match predicate (`1 = 1`).
    pub fn always() -> Self {
        Predicate::compare(1_i64, Comparator::Eq, 1_i64)
    }

    /// The never-match predicate (`0 = 1`).
    pub fn never() -> Self {
        Predicate::compare(0_i64, Comparator::Eq, 1_i64)
    }
}

/// Combine two predicates under AND (free-function form).
pub fn and_(left: Predicate, right: Predicate) -> Predicate {
    left.and(right)
}

/// Combine two predicates under OR (free-function form).
pub fn or_(left: Predicate, right: Predicate) -> Predicate {
    left.or(right)
}

/// A column marker used to start comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
}

/// Create a field marker for `name`.
pub fn field(name: impl Into<String>) -> Field {
    Field { name: name.into() }
}

impl Field {
    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `self = other`
    pub fn eq(self, other: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparator::Eq, other)
    }

    /// `self != other`
    pub fn ne(self, other: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparator::Ne, other)
    }

    /// `self > other`
    pub fn gt(self, other: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparator::Gt, other)
    }

    /// `self >= other`
    pub fn ge(self, other: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparator::Ge, other)
    }

    /// `self < other`
    pub fn lt(self, other: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparator::Lt, other)
    }

    /// `self <= other`
    pub fn le(self, other: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparator::Le, other)
    }
}
