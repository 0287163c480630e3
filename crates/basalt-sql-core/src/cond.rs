//! Predicate trees for WHERE and HAVING clauses.

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::quote::{quote_identifier, quote_value};
use crate::value::Value;

/// A comparison operator for predicate leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
}

impl Op {
    /// The SQL spelling of the operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
        }
    }

    /// Parses the spellings accepted by the string mini-language.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "=" | "==" => Some(Self::Eq),
            "!=" | "<>" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Lte),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Gte),
            "like" => Some(Self::Like),
            "not like" => Some(Self::NotLike),
            "in" => Some(Self::In),
            "not in" => Some(Self::NotIn),
            _ => None,
        }
    }
}

/// A predicate tree.
///
/// Leaves are `(column, op, value)` triples; AND/OR connectives join
/// sub-trees left to right, and grouping is explicit in the tree shape (a
/// nested `And`/`Or` compiles parenthesized).
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    /// A single comparison.
    Compare {
        /// Column name, possibly dotted.
        column: String,
        /// Comparison operator.
        op: Op,
        /// Right-hand value, quoted inline at compile time.
        value: Value,
    },
    /// Every branch must hold.
    And(Vec<Cond>),
    /// At least one branch must hold.
    Or(Vec<Cond>),
    /// The inner condition must not hold.
    Not(Box<Cond>),
    /// A raw fragment used verbatim.
    Raw(Expr),
}

impl Cond {
    /// Creates a comparison leaf.
    pub fn compare(column: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `column = value`, or `column IS NULL` when the value is NULL.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Eq, value)
    }

    /// `column != value`, or `column IS NOT NULL` when the value is NULL.
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Ne, value)
    }

    /// `column < value`
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Lt, value)
    }

    /// `column <= value`
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Lte, value)
    }

    /// `column > value`
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Gt, value)
    }

    /// `column >= value`
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Op::Gte, value)
    }

    /// `column LIKE pattern`
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(column, Op::Like, Value::Text(pattern.into()))
    }

    /// `column NOT LIKE pattern`
    pub fn not_like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(column, Op::NotLike, Value::Text(pattern.into()))
    }

    /// `column IS NULL`
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::compare(column, Op::Eq, Value::Null)
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::compare(column, Op::Ne, Value::Null)
    }

    /// `column IN (values...)`
    pub fn in_list<T, I>(column: impl Into<String>, values: I) -> Self
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        Self::compare(column, Op::In, Value::list(values))
    }

    /// `column NOT IN (values...)`
    pub fn not_in_list<T, I>(column: impl Into<String>, values: I) -> Self
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        Self::compare(column, Op::NotIn, Value::list(values))
    }

    /// A raw predicate fragment.
    ///
    /// **Warning**: the fragment is compiled verbatim. Never feed it user
    /// input.
    pub fn raw(sql: impl Into<Expr>) -> Self {
        Self::Raw(sql.into())
    }

    /// Groups conditions with AND.
    pub fn all(conds: impl IntoIterator<Item = Cond>) -> Self {
        Self::And(conds.into_iter().collect())
    }

    /// Groups conditions with OR.
    pub fn any(conds: impl IntoIterator<Item = Cond>) -> Self {
        Self::Or(conds.into_iter().collect())
    }

    /// Joins with AND: `self AND other`.
    #[must_use]
    pub fn and(self, other: Cond) -> Self {
        match self {
            Self::And(mut branches) => {
                branches.push(other);
                Self::And(branches)
            }
            leaf => Self::And(vec![leaf, other]),
        }
    }

    /// Joins with OR: `self OR other`.
    #[must_use]
    pub fn or(self, other: Cond) -> Self {
        match self {
            Self::Or(mut branches) => {
                branches.push(other);
                Self::Or(branches)
            }
            leaf => Self::Or(vec![leaf, other]),
        }
    }

    /// Negates: `NOT (self)`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Compiles the tree to SQL text.
    pub(crate) fn to_sql(&self, engine: &dyn Engine) -> Result<String> {
        match self {
            Self::Compare { column, op, value } => {
                let column = quote_identifier(column);
                match (op, value) {
                    (Op::Eq, Value::Null) => Ok(format!("{column} IS NULL")),
                    (Op::Ne, Value::Null) => Ok(format!("{column} IS NOT NULL")),
                    (Op::In | Op::NotIn, Value::List(items)) if items.is_empty() => {
                        Err(Error::QueryBuild(format!(
                            "{} on `{column}` with an empty value list",
                            op.as_sql()
                        )))
                    }
                    _ => Ok(format!(
                        "{column} {} {}",
                        op.as_sql(),
                        quote_value(engine, value)?
                    )),
                }
            }
            Self::And(branches) => group_sql(engine, branches, " AND "),
            Self::Or(branches) => group_sql(engine, branches, " OR "),
            Self::Not(inner) => Ok(format!("NOT ({})", inner.to_sql(engine)?)),
            Self::Raw(expr) => Ok(String::from(expr.as_str())),
        }
    }
}

fn group_sql(engine: &dyn Engine, branches: &[Cond], sep: &str) -> Result<String> {
    if branches.is_empty() {
        return Err(Error::QueryBuild(String::from("empty condition group")));
    }
    let parts = branches
        .iter()
        .map(|branch| {
            let sql = branch.to_sql(engine)?;
            // Nested connectives keep their grouping parenthesized.
            if matches!(branch, Cond::And(_) | Cond::Or(_)) {
                Ok(format!("({sql})"))
            } else {
                Ok(sql)
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(sep))
}
