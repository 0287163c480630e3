//! Lazy cursor over a driver result handle.

use std::collections::HashMap;

use crate::engine::Rows;
use crate::error::{EngineError, Error, Result};
use crate::row::{FromRow, Row};
use crate::value::Value;

/// Adapts one driver result handle into a row-oriented view.
///
/// Nothing is copied until asked: forward iteration yields one row at a
/// time, and `all` defers to the driver's bulk fetch. The cursor owns its
/// handle exclusively. After a fetch error the position is undefined and
/// iteration must not continue.
pub struct Cursor {
    rows: Box<dyn Rows>,
    current: Option<Row>,
    index_by: Option<String>,
}

impl Cursor {
    /// Wraps a driver handle. `index_by` keys [`Cursor::all_indexed`].
    #[must_use]
    pub fn new(rows: Box<dyn Rows>, index_by: Option<String>) -> Self {
        Self {
            rows,
            current: None,
            index_by,
        }
    }

    /// Total number of rows in the result.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when iteration can be restarted.
    #[must_use]
    pub fn rewindable(&self) -> bool {
        self.rows.rewindable()
    }

    /// Moves to row `pos`; the next fetch returns it.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        self.rows.seek(pos).map_err(Error::Cursor)
    }

    /// Restarts iteration from the first row.
    pub fn rewind(&mut self) -> Result<()> {
        self.seek(0)
    }

    /// Fetches the next row, advancing the position.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        let row = self.rows.next_row().map_err(Error::Cursor)?;
        self.current.clone_from(&row);
        Ok(row)
    }

    /// Fetches the row at `pos` regardless of the current position.
    pub fn row_at(&mut self, pos: usize) -> Result<Option<Row>> {
        if pos >= self.row_count() {
            return Ok(None);
        }
        self.seek(pos)?;
        self.next_row()
    }

    /// One field of the row at the current position.
    ///
    /// A NULL value falls back to `default`. A column that does not exist
    /// in the result schema is `Error::FieldNotFound` — not the same thing
    /// as present-but-NULL.
    pub fn column(&self, name: &str, default: Option<Value>) -> Result<Value> {
        let Some(row) = &self.current else {
            return Err(Error::Cursor(EngineError::new(
                None,
                "cursor is not positioned on a row",
            )));
        };
        match row.get(name) {
            None => Err(Error::FieldNotFound(String::from(name))),
            Some(Value::Null) => Ok(default.unwrap_or(Value::Null)),
            Some(value) => Ok(value.clone()),
        }
    }

    /// Materializes every remaining row through the driver's bulk fetch.
    pub fn all(&mut self) -> Result<Vec<Row>> {
        self.rows.fetch_all().map_err(Error::Cursor)
    }

    /// Hydrates every remaining row into `T`, one row at a time.
    pub fn all_as<T: FromRow>(&mut self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        while let Some(row) = self.next_row()? {
            out.push(T::from_row(&row)?);
        }
        Ok(out)
    }

    /// Materializes remaining rows into a mapping keyed by the `index_by`
    /// column's value.
    ///
    /// Keys need not be unique: a later row silently overwrites an earlier
    /// one with the same key (last-wins).
    pub fn all_indexed(&mut self) -> Result<HashMap<String, Row>> {
        let Some(key) = self.index_by.clone() else {
            return Err(Error::QueryBuild(String::from(
                "`all_indexed` requires an `index_by` column",
            )));
        };
        let mut out = HashMap::new();
        while let Some(row) = self.next_row()? {
            let text = key_text(row.try_get(&key)?);
            out.insert(text, row);
        }
        Ok(out)
    }

    /// Builds a key-column to value-column mapping across all remaining
    /// rows, in iteration order.
    ///
    /// `seed` entries are prepended: a bare value lands under the blank
    /// key, mapping entries are merged at the start. This feeds
    /// selection-list UI helpers.
    pub fn to_list(
        &mut self,
        key: &str,
        value: &str,
        seed: Option<ListSeed>,
    ) -> Result<Vec<(String, Value)>> {
        let mut out: Vec<(String, Value)> = match seed {
            Some(ListSeed::Prompt(v)) => vec![(String::new(), v)],
            Some(ListSeed::Entries(entries)) => entries,
            None => Vec::new(),
        };
        while let Some(row) = self.next_row()? {
            let k = key_text(row.try_get(key)?);
            let v = row.try_get(value)?.clone();
            out.push((k, v));
        }
        Ok(out)
    }

    /// Exports every remaining row as a JSON array of objects.
    pub fn to_array(&mut self) -> Result<serde_json::Value> {
        let rows = self.all()?;
        Ok(serde_json::Value::Array(
            rows.iter().map(Row::to_json).collect(),
        ))
    }
}

impl Iterator for Cursor {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Seed entry for [`Cursor::to_list`].
#[derive(Debug, Clone)]
pub enum ListSeed {
    /// A bare value inserted under the blank key (a "please select" prompt).
    Prompt(Value),
    /// Entries merged at the start of the mapping.
    Entries(Vec<(String, Value)>),
}

/// Canonical string form of an index/list key.
fn key_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
        Value::Null => String::new(),
        other => format!("{other:?}"),
    }
}
