//! The fluent query builder.
//!
//! A `Query` is a mutable state container for one statement. Clause methods
//! only accumulate state — no I/O, no compilation — until a terminal method
//! (`get`, `one`, `all`, `count`, `execute`) compiles the state and hands
//! the SQL to the engine.

use std::collections::HashMap;

use tracing::debug;

use crate::compile;
use crate::cond::Cond;
use crate::cursor::Cursor;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::quote::SqlRef;
use crate::row::{FromRow, Row};
use crate::value::Value;

/// Statement kind tag.
///
/// Builder state is mutually exclusive per kind: the compiler ignores state
/// that does not apply to the current kind and fails fast when required
/// state is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Row-returning SELECT.
    Select,
    /// INSERT of one or more tuples.
    Insert,
    /// UPDATE with SET assignments.
    Update,
    /// DELETE.
    Delete,
}

/// Join flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `CROSS JOIN`
    Cross,
}

impl JoinKind {
    pub(crate) const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// One join clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) table: SqlRef,
    pub(crate) on: Option<Expr>,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    pub(crate) const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A statement under construction.
///
/// Clause compilation order is fixed — select, from, join, where, group by,
/// having, order by, limit/offset — regardless of the order clauses were
/// attached; only content within one clause keeps call order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub(crate) kind: QueryKind,
    pub(crate) table: Option<SqlRef>,
    pub(crate) columns: Vec<SqlRef>,
    pub(crate) distinct: bool,
    pub(crate) joins: Vec<Join>,
    pub(crate) cond: Option<Cond>,
    pub(crate) group_by: Vec<SqlRef>,
    pub(crate) having: Option<Cond>,
    pub(crate) order_by: Vec<(SqlRef, Direction)>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) tuples: Vec<Vec<Value>>,
    pub(crate) assignments: Vec<(String, Value)>,
    pub(crate) index_by: Option<String>,
}

impl Query {
    fn with_kind(kind: QueryKind, table: Option<SqlRef>) -> Self {
        Self {
            kind,
            table,
            columns: Vec::new(),
            distinct: false,
            joins: Vec::new(),
            cond: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            tuples: Vec::new(),
            assignments: Vec::new(),
            index_by: None,
        }
    }

    /// Starts a SELECT. The column list defaults to `*`.
    #[must_use]
    pub fn select() -> Self {
        Self::with_kind(QueryKind::Select, None)
    }

    /// Starts an INSERT into `table`.
    #[must_use]
    pub fn insert(table: impl Into<SqlRef>) -> Self {
        Self::with_kind(QueryKind::Insert, Some(table.into()))
    }

    /// Starts an UPDATE of `table`.
    #[must_use]
    pub fn update(table: impl Into<SqlRef>) -> Self {
        Self::with_kind(QueryKind::Update, Some(table.into()))
    }

    /// Starts a DELETE from `table`.
    #[must_use]
    pub fn delete(table: impl Into<SqlRef>) -> Self {
        Self::with_kind(QueryKind::Delete, Some(table.into()))
    }

    /// The statement kind.
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Sets the column list (SELECT output, or INSERT target columns).
    #[must_use]
    pub fn columns<I, C>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<SqlRef>,
    {
        self.columns = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Appends one column to the list.
    #[must_use]
    pub fn column(mut self, col: impl Into<SqlRef>) -> Self {
        self.columns.push(col.into());
        self
    }

    /// Sets SELECT DISTINCT.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Sets the source table.
    #[must_use]
    pub fn from(mut self, table: impl Into<SqlRef>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Adds an INNER JOIN.
    #[must_use]
    pub fn join(mut self, table: impl Into<SqlRef>, on: impl Into<Expr>) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Inner,
            table: table.into(),
            on: Some(on.into()),
        });
        self
    }

    /// Adds a LEFT JOIN.
    #[must_use]
    pub fn left_join(mut self, table: impl Into<SqlRef>, on: impl Into<Expr>) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Left,
            table: table.into(),
            on: Some(on.into()),
        });
        self
    }

    /// Adds a RIGHT JOIN.
    #[must_use]
    pub fn right_join(mut self, table: impl Into<SqlRef>, on: impl Into<Expr>) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Right,
            table: table.into(),
            on: Some(on.into()),
        });
        self
    }

    /// Adds a CROSS JOIN.
    #[must_use]
    pub fn cross_join(mut self, table: impl Into<SqlRef>) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Cross,
            table: table.into(),
            on: None,
        });
        self
    }

    /// ANDs `cond` into the predicate tree.
    #[must_use]
    pub fn filter(mut self, cond: Cond) -> Self {
        self.cond = Some(match self.cond.take() {
            Some(prev) => prev.and(cond),
            None => cond,
        });
        self
    }

    /// ORs `cond` into the predicate tree.
    #[must_use]
    pub fn or_filter(mut self, cond: Cond) -> Self {
        self.cond = Some(match self.cond.take() {
            Some(prev) => prev.or(cond),
            None => cond,
        });
        self
    }

    /// Sets the GROUP BY columns.
    #[must_use]
    pub fn group_by<I, C>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<SqlRef>,
    {
        self.group_by = cols.into_iter().map(Into::into).collect();
        self
    }

    /// ANDs `cond` into the HAVING tree.
    #[must_use]
    pub fn having(mut self, cond: Cond) -> Self {
        self.having = Some(match self.having.take() {
            Some(prev) => prev.and(cond),
            None => cond,
        });
        self
    }

    /// Appends an ORDER BY term.
    #[must_use]
    pub fn order_by(mut self, col: impl Into<SqlRef>, dir: Direction) -> Self {
        self.order_by.push((col.into(), dir));
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets the OFFSET.
    #[must_use]
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Keys `all_indexed` materialization by this column's value.
    ///
    /// Keys need not be unique: a later row silently overwrites an earlier
    /// one with the same key.
    #[must_use]
    pub fn index_by(mut self, column: impl Into<String>) -> Self {
        self.index_by = Some(column.into());
        self
    }

    /// Adds one VALUES tuple.
    #[must_use]
    pub fn values<I, V>(mut self, vals: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.tuples.push(vals.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a batch of VALUES tuples (multi-row insert).
    #[must_use]
    pub fn values_many<I, R, V>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for row in rows {
            self.tuples.push(row.into_iter().map(Into::into).collect());
        }
        self
    }

    /// Supplies column/value pairs as a mapping; the target column list is
    /// derived from the mapping's keys.
    #[must_use]
    pub fn values_map<I, N, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<Value>,
    {
        let mut columns = Vec::new();
        let mut tuple = Vec::new();
        for (name, value) in pairs {
            columns.push(SqlRef::Name(name.into()));
            tuple.push(value.into());
        }
        self.columns = columns;
        self.tuples.push(tuple);
        self
    }

    /// Adds one SET assignment.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    /// Adds SET assignments from a mapping.
    #[must_use]
    pub fn set_map<I, N, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in pairs {
            self.assignments.push((name.into(), value.into()));
        }
        self
    }

    /// Compiles the current state to one SQL string.
    pub fn to_sql(&self, engine: &dyn Engine) -> Result<String> {
        compile::compile(self, engine)
    }

    /// Executes a SELECT and returns a cursor over the result.
    pub fn get(&self, engine: &dyn Engine) -> Result<Cursor> {
        if self.kind != QueryKind::Select {
            return Err(Error::QueryBuild(String::from(
                "`get` requires a SELECT statement; use `execute` for writes",
            )));
        }
        let sql = self.to_sql(engine)?;
        debug!(target: "basalt::sql", sql = %sql, "query");
        let rows = engine
            .query(&sql)
            .map_err(|source| Error::Execute { sql: sql.clone(), source })?;
        Ok(Cursor::new(rows, self.index_by.clone()))
    }

    /// Executes a write statement.
    ///
    /// Returns the engine-issued identifier for INSERT, the affected-row
    /// count for UPDATE and DELETE.
    pub fn execute(&self, engine: &dyn Engine) -> Result<i64> {
        let sql = self.to_sql(engine)?;
        debug!(target: "basalt::sql", sql = %sql, "execute");
        match self.kind {
            QueryKind::Select => Err(Error::QueryBuild(String::from(
                "`execute` requires a write statement; use `get` for SELECT",
            ))),
            QueryKind::Insert => engine
                .insert(&sql)
                .map_err(|source| Error::Execute { sql: sql.clone(), source }),
            QueryKind::Update | QueryKind::Delete => engine
                .execute(&sql)
                .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
                .map_err(|source| Error::Execute { sql: sql.clone(), source }),
        }
    }

    /// Executes with `limit 1` and returns the first row.
    ///
    /// An empty result is `None` — the absent-value sentinel, never an
    /// error.
    pub fn one(&self, engine: &dyn Engine) -> Result<Option<Row>> {
        let mut cursor = self.clone().limit(1).get(engine)?;
        cursor.next_row()
    }

    /// Like [`Query::one`], hydrating the row into `T`.
    pub fn one_as<T: FromRow>(&self, engine: &dyn Engine) -> Result<Option<T>> {
        match self.one(engine)? {
            Some(row) => Ok(Some(T::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Executes and materializes every row.
    pub fn all(&self, engine: &dyn Engine) -> Result<Vec<Row>> {
        self.get(engine)?.all()
    }

    /// Executes and hydrates every row into `T`.
    pub fn all_as<T: FromRow>(&self, engine: &dyn Engine) -> Result<Vec<T>> {
        self.get(engine)?.all_as()
    }

    /// Executes and materializes a mapping keyed by the `index_by` column.
    pub fn all_indexed(&self, engine: &dyn Engine) -> Result<HashMap<String, Row>> {
        self.get(engine)?.all_indexed()
    }

    /// Counts matching rows.
    ///
    /// Compiles a clone with the column list swapped for `COUNT(*)`; this
    /// builder's own column list is untouched, so it stays usable for
    /// `all`/`get` afterwards.
    pub fn count(&self, engine: &dyn Engine) -> Result<i64> {
        let counter = self
            .clone()
            .columns([SqlRef::Expr(Expr::new("COUNT(*)"))]);
        match counter.one(engine)? {
            None => Ok(0),
            Some(row) => Ok(match row.iter().next() {
                Some((_, Value::Int(n))) => *n,
                Some((_, Value::Text(s))) => s.parse().unwrap_or(0),
                _ => 0,
            }),
        }
    }
}
