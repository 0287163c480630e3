//! Statement compilation: builder state to SQL text.
//!
//! One entry point per statement kind, assembling clauses in the fixed
//! order select, from, join, where, group by, having, order by,
//! limit/offset. Identifiers and values are routed through `quote`; state
//! that does not apply to the statement kind is ignored.

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::query::{Query, QueryKind};
use crate::quote::{quote_column, quote_identifier, quote_table, quote_value};

/// Compiles `query` into one SQL string with every value inlined as a
/// quoted literal.
pub(crate) fn compile(query: &Query, engine: &dyn Engine) -> Result<String> {
    match query.kind {
        QueryKind::Select => compile_select(query, engine),
        QueryKind::Insert => compile_insert(query, engine),
        QueryKind::Update => compile_update(query, engine),
        QueryKind::Delete => compile_delete(query, engine),
    }
}

fn table_sql(query: &Query, engine: &dyn Engine) -> Result<String> {
    let table = query
        .table
        .as_ref()
        .ok_or_else(|| Error::QueryBuild(String::from("statement has no target table")))?;
    quote_table(engine, table)
}

fn compile_select(query: &Query, engine: &dyn Engine) -> Result<String> {
    let mut sql = String::from("SELECT ");
    if query.distinct {
        sql.push_str("DISTINCT ");
    }

    if query.columns.is_empty() {
        sql.push('*');
    } else {
        let cols = query
            .columns
            .iter()
            .map(|col| quote_column(engine, col, None))
            .collect::<Result<Vec<_>>>()?;
        sql.push_str(&cols.join(", "));
    }

    sql.push_str(" FROM ");
    sql.push_str(&table_sql(query, engine)?);

    for join in &query.joins {
        sql.push(' ');
        sql.push_str(join.kind.as_sql());
        sql.push(' ');
        sql.push_str(&quote_table(engine, &join.table)?);
        if let Some(on) = &join.on {
            sql.push_str(" ON ");
            sql.push_str(on.as_str());
        }
    }

    if let Some(cond) = &query.cond {
        sql.push_str(" WHERE ");
        sql.push_str(&cond.to_sql(engine)?);
    }

    if !query.group_by.is_empty() {
        let cols = query
            .group_by
            .iter()
            .map(|col| quote_column(engine, col, None))
            .collect::<Result<Vec<_>>>()?;
        sql.push_str(" GROUP BY ");
        sql.push_str(&cols.join(", "));
    }

    if let Some(having) = &query.having {
        sql.push_str(" HAVING ");
        sql.push_str(&having.to_sql(engine)?);
    }

    if !query.order_by.is_empty() {
        let terms = query
            .order_by
            .iter()
            .map(|(col, dir)| Ok(format!("{} {}", quote_column(engine, col, None)?, dir.as_sql())))
            .collect::<Result<Vec<_>>>()?;
        sql.push_str(" ORDER BY ");
        sql.push_str(&terms.join(", "));
    }

    if let Some(n) = query.limit {
        sql.push_str(&format!(" LIMIT {n}"));
    }
    if let Some(n) = query.offset {
        sql.push_str(&format!(" OFFSET {n}"));
    }

    Ok(sql)
}

fn compile_insert(query: &Query, engine: &dyn Engine) -> Result<String> {
    if query.tuples.is_empty() {
        return Err(Error::QueryBuild(String::from(
            "INSERT requires at least one VALUES tuple",
        )));
    }

    let mut sql = String::from("INSERT INTO ");
    sql.push_str(&table_sql(query, engine)?);

    if !query.columns.is_empty() {
        for tuple in &query.tuples {
            if tuple.len() != query.columns.len() {
                return Err(Error::QueryBuild(format!(
                    "INSERT tuple has {} values for {} columns",
                    tuple.len(),
                    query.columns.len()
                )));
            }
        }
        let cols = query
            .columns
            .iter()
            .map(|col| quote_column(engine, col, None))
            .collect::<Result<Vec<_>>>()?;
        sql.push_str(" (");
        sql.push_str(&cols.join(", "));
        sql.push(')');
    }

    sql.push_str(" VALUES ");
    let rows = query
        .tuples
        .iter()
        .map(|tuple| {
            let parts = tuple
                .iter()
                .map(|value| quote_value(engine, value))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("({})", parts.join(", ")))
        })
        .collect::<Result<Vec<_>>>()?;
    sql.push_str(&rows.join(", "));

    Ok(sql)
}

fn compile_update(query: &Query, engine: &dyn Engine) -> Result<String> {
    if query.assignments.is_empty() {
        return Err(Error::QueryBuild(String::from(
            "UPDATE requires at least one SET assignment",
        )));
    }

    let mut sql = String::from("UPDATE ");
    sql.push_str(&table_sql(query, engine)?);
    sql.push_str(" SET ");

    let parts = query
        .assignments
        .iter()
        .map(|(column, value)| {
            Ok(format!(
                "{} = {}",
                quote_identifier(column),
                quote_value(engine, value)?
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    sql.push_str(&parts.join(", "));

    if let Some(cond) = &query.cond {
        sql.push_str(" WHERE ");
        sql.push_str(&cond.to_sql(engine)?);
    }

    Ok(sql)
}

fn compile_delete(query: &Query, engine: &dyn Engine) -> Result<String> {
    let mut sql = String::from("DELETE FROM ");
    sql.push_str(&table_sql(query, engine)?);

    if let Some(cond) = &query.cond {
        sql.push_str(" WHERE ");
        sql.push_str(&cond.to_sql(engine)?);
    }

    Ok(sql)
}
