//! SQL statement generation.
//!
//! Statements are compiled from the same predicate tree the in-memory
//! evaluator walks, so both execution paths interpret a query identically.
//! Placeholders are positional `?`; identifiers are double-quoted. Every
//! mapped row carries a synthetic leading hashkey column, which makes
//! `get` and `delete` point lookups.

use stratum_core::{
    Comparator, Datatype, Error, HashKey, LimitClause, Operand, Predicate, Result, Select, Table,
    Value,
};

/// Name of the synthetic identity column present on every mapped table.
pub const HASHKEY_COLUMN: &str = "_hashkey";

/// A generated statement: SQL text plus bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// The SQL text with `?` placeholders.
    pub sql: String,
    /// Parameter values in placeholder order.
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// The storage-level type for a column datatype.
pub fn storage_type(datatype: &Datatype) -> String {
    match datatype {
        Datatype::One { .. } | Datatype::Many { .. } => "integer".to_string(),
        Datatype::Integer | Datatype::Boolean | Datatype::Enum { .. } => "integer".to_string(),
        Datatype::Number { length, decimals } => format!("numeric({length}, {decimals})"),
        Datatype::Timestamp => "timestamp".to_string(),
        Datatype::Text | Datatype::LongText | Datatype::Opaque => "text".to_string(),
    }
}

/// `CREATE TABLE IF NOT EXISTS` for a mapped table.
pub fn create_table(table: &Table) -> Statement {
    let mut columns = vec![format!("{} integer PRIMARY KEY", quote(HASHKEY_COLUMN))];
    for column in table.columns().values() {
        columns.push(format!(
            "{} {}",
            quote(&column.name),
            storage_type(&column.datatype)
        ));
    }
    Statement::new(
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote(table.name()),
            columns.join(", ")
        ),
        Vec::new(),
    )
}

/// `INSERT OR REPLACE` of one encoded row, keyed by hashkey.
pub fn insert(table: &Table, key: HashKey, encoded: Vec<Value>) -> Statement {
    let mut names = vec![quote(HASHKEY_COLUMN)];
    names.extend(table.columns().values().map(|c| quote(&c.name)));
    let placeholders = vec!["?"; names.len()].join(", ");

    let mut params = Vec::with_capacity(encoded.len() + 1);
    params.push(Value::Int(key.as_u64() as i64));
    params.extend(encoded);

    Statement::new(
        format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            quote(table.name()),
            names.join(", "),
            placeholders
        ),
        params,
    )
}

/// `DELETE` of one row by hashkey.
pub fn delete(table: &Table, key: HashKey) -> Statement {
    Statement::new(
        format!(
            "DELETE FROM {} WHERE {} = ?",
            quote(table.name()),
            quote(HASHKEY_COLUMN)
        ),
        vec![Value::Int(key.as_u64() as i64)],
    )
}

/// Point lookup of one row by hashkey.
pub fn get(table: &Table, key: HashKey) -> Statement {
    Statement::new(
        format!(
            "SELECT * FROM {} WHERE {} = ?",
            quote(table.name()),
            quote(HASHKEY_COLUMN)
        ),
        vec![Value::Int(key.as_u64() as i64)],
    )
}

/// Compile a query descriptor against its table.
pub fn select(table: &Table, query: &Select) -> Result<Statement> {
    let mut sql = format!("SELECT * FROM {}", quote(table.name()));
    let mut params = Vec::new();

    if let Some(predicate) = query.predicate() {
        sql.push_str(" WHERE ");
        build_predicate(predicate, &mut sql, &mut params)?;
    }

    if !query.order_by().is_empty() {
        let clauses: Vec<String> = query
            .order_by()
            .iter()
            .map(|c| {
                format!(
                    "{} {}",
                    quote(&c.field),
                    if c.ascending { "ASC" } else { "DESC" }
                )
            })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&clauses.join(", "));
    }

    if let Some(LimitClause { start, end }) = query.limit() {
        match end {
            // half-open [start, end) becomes LIMIT count OFFSET start
            Some(end) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", end.saturating_sub(start), start));
            }
            None if start > 0 => sql.push_str(&format!(" LIMIT -1 OFFSET {start}")),
            None => {}
        }
    }

    Ok(Statement::new(sql, params))
}

fn build_predicate(predicate: &Predicate, sql: &mut String, params: &mut Vec<Value>) -> Result<()> {
    match predicate {
        Predicate::Compare { lhs, op, rhs } => {
            build_operand(lhs, sql, params)?;
            sql.push(' ');
            sql.push_str(comparator_sql(*op));
            sql.push(' ');
            build_operand(rhs, sql, params)?;
        }
        Predicate::And(left, right) => {
            sql.push('(');
            build_predicate(left, sql, params)?;
            sql.push_str(" AND ");
            build_predicate(right, sql, params)?;
            sql.push(')');
        }
        Predicate::Or(left, right) => {
            sql.push('(');
            build_predicate(left, sql, params)?;
            sql.push_str(" OR ");
            build_predicate(right, sql, params)?;
            sql.push(')');
        }
    }
    Ok(())
}

fn build_operand(operand: &Operand, sql: &mut String, params: &mut Vec<Value>) -> Result<()> {
    match operand {
        Operand::Field(name) => sql.push_str(&quote(name)),
        Operand::Literal(value) => match value {
            Value::Record(_) | Value::Collection(_) => {
                return Err(Error::invalid_value(format!(
                    "{} literal cannot be bound as a SQL parameter",
                    value.type_name()
                )));
            }
            other => {
                sql.push('?');
                params.push(other.clone());
            }
        },
    }
    Ok(())
}

const fn comparator_sql(op: Comparator) -> &'static str {
    match op {
        Comparator::Eq => "=",
        Comparator::Ne => "<>",
        Comparator::Gt => ">",
        Comparator::Ge => ">=",
        Comparator::Lt => "<",
        Comparator::Le => "<=",
    }
}
