//! Identifier and value quoting.
//!
//! Centralizing every type-to-literal decision here is what keeps injection
//! out: each caller-supplied value that ends up inside SQL text passes
//! through [`quote_value`], each identifier through [`quote_column`] /
//! [`quote_table`]. Nothing else in the crate concatenates raw input.

use crate::compile;
use crate::engine::Engine;
use crate::error::{EngineError, Error, Result};
use crate::expr::Expr;
use crate::query::Query;
use crate::value::Value;

/// A column or table reference.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlRef {
    /// A plain identifier, possibly dotted (`table.column`).
    Name(String),
    /// An identifier with an alias, compiled as ``name AS `alias` ``.
    Aliased(String, String),
    /// A raw fragment used verbatim.
    Expr(Expr),
    /// A parenthesized sub-select.
    Subquery(Box<Query>),
}

impl From<&str> for SqlRef {
    fn from(name: &str) -> Self {
        Self::Name(String::from(name))
    }
}

impl From<String> for SqlRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<(&str, &str)> for SqlRef {
    fn from((name, alias): (&str, &str)) -> Self {
        Self::Aliased(String::from(name), String::from(alias))
    }
}

impl From<(String, String)> for SqlRef {
    fn from((name, alias): (String, String)) -> Self {
        Self::Aliased(name, alias)
    }
}

impl From<Expr> for SqlRef {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}

impl From<Query> for SqlRef {
    fn from(query: Query) -> Self {
        Self::Subquery(Box::new(query))
    }
}

/// Quotes one identifier with the backtick convention.
///
/// Embedded backticks are doubled, dotted names are quoted per segment, and
/// a literal `*` segment stays bare (so `users.*` becomes `` `users`.* ``).
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    let escaped = name.replace('`', "``");
    escaped
        .split('.')
        .map(|segment| {
            if segment == "*" {
                String::from(segment)
            } else {
                format!("`{segment}`")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn qualify(name: &str, table: Option<&str>) -> String {
    match table {
        Some(table) if !name.contains('.') => quote_identifier(&format!("{table}.{name}")),
        _ => quote_identifier(name),
    }
}

/// Quotes a column reference.
///
/// `table` qualifies plain columns that carry no qualifier of their own; a
/// column that is exactly `*` yields `*` or `` `table`.* ``, never a quoted
/// asterisk.
pub fn quote_column(engine: &dyn Engine, column: &SqlRef, table: Option<&str>) -> Result<String> {
    match column {
        SqlRef::Name(name) => Ok(qualify(name, table)),
        SqlRef::Aliased(name, alias) => Ok(format!(
            "{} AS {}",
            qualify(name, table),
            quote_identifier(alias)
        )),
        SqlRef::Expr(expr) => Ok(String::from(expr.as_str())),
        SqlRef::Subquery(query) => Ok(format!("({})", compile::compile(query, engine)?)),
    }
}

/// Quotes a table reference. Always fully quoted, optionally aliased.
pub fn quote_table(engine: &dyn Engine, table: &SqlRef) -> Result<String> {
    match table {
        SqlRef::Name(name) => Ok(quote_identifier(name)),
        SqlRef::Aliased(name, alias) => Ok(format!(
            "{} AS {}",
            quote_identifier(name),
            quote_identifier(alias)
        )),
        SqlRef::Expr(expr) => Ok(String::from(expr.as_str())),
        SqlRef::Subquery(query) => Ok(format!("({})", compile::compile(query, engine)?)),
    }
}

/// Renders a bound value as an inline SQL literal.
pub fn quote_value(engine: &dyn Engine, value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::from("NULL")),
        // Historical engine convention: booleans travel as '1'/'0' strings,
        // not native boolean literals.
        Value::Bool(b) => Ok(String::from(if *b { "'1'" } else { "'0'" })),
        Value::Int(n) => Ok(n.to_string()),
        Value::Float(f) => {
            // `Display` for floats is fixed-notation and locale-independent,
            // which is exactly what the literal needs.
            if f.is_finite() {
                Ok(f.to_string())
            } else {
                Err(Error::Quoting(EngineError::new(
                    None,
                    format!("cannot quote non-finite float {f}"),
                )))
            }
        }
        Value::Text(s) => quote_str(engine, s),
        Value::Blob(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            Ok(format!("X'{hex}'"))
        }
        Value::DateTime(dt) => quote_str(engine, &dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        Value::List(items) => {
            let parts = items
                .iter()
                .map(|item| quote_value(engine, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("({})", parts.join(", ")))
        }
        Value::Expr(expr) => Ok(String::from(expr.as_str())),
        Value::Query(query) => Ok(format!("({})", compile::compile(query, engine)?)),
    }
}

fn quote_str(engine: &dyn Engine, text: &str) -> Result<String> {
    let escaped = engine.escape_string(text).map_err(Error::Quoting)?;
    Ok(format!("'{escaped}'"))
}
