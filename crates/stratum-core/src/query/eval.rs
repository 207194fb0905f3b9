//! In-process predicate evaluation.
//!
//! This is the evaluation contract every backend must reproduce, whether it
//! filters records directly or compiles the tree to another query language:
//! a comparison resolves each operand (field reference against the candidate
//! record, literal as-is) and applies the comparator under
//! [`Value::compare`]; combinators evaluate both children, so callers get
//! no short-circuit guarantee either way.

use crate::query::predicate::{Comparator, Operand, Predicate};
use crate::record::Record;
use crate::value::Value;
use std::cmp::Ordering;

/// Evaluate a predicate against a candidate record.
///
/// `None` for the predicate matches everything (an absent WHERE clause).
pub fn matches(predicate: Option<&Predicate>, record: &Record) -> bool {
    match predicate {
        None => true,
        Some(p) => evaluate(p, record),
    }
}

/// Evaluate a predicate tree against a candidate record.
pub fn evaluate(predicate: &Predicate, record: &Record) -> bool {
    match predicate {
        Predicate::Compare { lhs, op, rhs } => {
            compare(&resolve(lhs, record), *op, &resolve(rhs, record))
        }
        Predicate::And(left, right) => {
            // both children always evaluated; no short-circuit ordering
            let l = evaluate(left, record);
            let r = evaluate(right, record);
            l && r
        }
        Predicate::Or(left, right) => {
            let l = evaluate(left, record);
            let r = evaluate(right, record);
            l || r
        }
    }
}

/// Resolve one operand against the candidate: a field reference reads the
/// record (unset fields read as null), a literal passes through.
fn resolve(operand: &Operand, record: &Record) -> Value {
    match operand {
        Operand::Field(name) => record.field_value(name),
        Operand::Literal(value) => value.clone(),
    }
}

fn compare(lhs: &Value, op: Comparator, rhs: &Value) -> bool {
    match lhs.compare(rhs) {
        Some(ordering) => match op {
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Ne => ordering != Ordering::Equal,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Ge => ordering != Ordering::Less,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Le => ordering != Ordering::Greater,
        },
        // unordered operands match no comparator
        None => false,
    }
}
