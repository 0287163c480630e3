//! The database-engine collaborator boundary.
//!
//! The query layer owns no transport. It compiles SQL text and hands it to
//! an [`Engine`]; reads come back as a [`Rows`] handle. Implementations wrap
//! one driver connection; statements execute in the order issued and block
//! the caller until the engine responds.

use std::time::Duration;

use crate::error::EngineError;
use crate::row::Row;

/// A synchronous database engine.
///
/// Failed statements are never retried by the query layer: the engine's
/// error propagates verbatim, wrapped with the offending SQL.
pub trait Engine {
    /// Escapes a string for inclusion in a single-quoted literal.
    ///
    /// Returns the escaped body only, without the surrounding quotes. This
    /// is allowed to fail because some drivers escape through the live
    /// connection (and that connection can be gone).
    fn escape_string(&self, text: &str) -> Result<String, EngineError>;

    /// Executes a row-returning statement.
    fn query(&self, sql: &str) -> Result<Box<dyn Rows>, EngineError>;

    /// Executes a non-returning statement; returns the affected-row count.
    fn execute(&self, sql: &str) -> Result<u64, EngineError>;

    /// Executes an INSERT; returns the engine-issued row identifier.
    fn insert(&self, sql: &str) -> Result<i64, EngineError>;

    /// Opens a transaction on the underlying connection.
    ///
    /// Transactions are coarse and connection-scoped; a nested `begin` is
    /// just another statement and the caller's responsibility to avoid.
    fn begin(&self) -> Result<(), EngineError>;

    /// Commits the open transaction.
    fn commit(&self) -> Result<(), EngineError>;

    /// Rolls back the open transaction.
    fn rollback(&self) -> Result<(), EngineError>;

    /// Acquires a named advisory lock, waiting up to `timeout`.
    ///
    /// Returns `false` when the lock could not be acquired in time.
    fn acquire_lock(&self, name: &str, timeout: Duration) -> Result<bool, EngineError>;

    /// Releases a named advisory lock.
    ///
    /// Returns `false` when the lock was not held by this engine.
    fn release_lock(&self, name: &str) -> Result<bool, EngineError>;
}

/// A driver result handle: the rows produced by one query.
///
/// The handle is position-based. `seek` moves the read position, `next_row`
/// fetches the row there and advances past it.
pub trait Rows: std::fmt::Debug {
    /// Total number of rows in the result.
    fn len(&self) -> usize;

    /// True when the result holds no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when iteration can be restarted by seeking backwards.
    fn rewindable(&self) -> bool;

    /// Moves the read position so the next fetch returns row `pos`.
    ///
    /// `pos == len()` is valid and positions past the last row.
    fn seek(&mut self, pos: usize) -> Result<(), EngineError>;

    /// Fetches the row at the read position, or `None` past the end.
    fn next_row(&mut self) -> Result<Option<Row>, EngineError>;

    /// Fetches every remaining row in one driver call.
    fn fetch_all(&mut self) -> Result<Vec<Row>, EngineError>;
}

/// A fully materialized, rewindable result handle.
///
/// Drivers that buffer their result sets client-side hand rows over as a
/// `BufferedRows`; tests use it directly.
#[derive(Debug, Default)]
pub struct BufferedRows {
    rows: Vec<Row>,
    pos: usize,
}

impl BufferedRows {
    /// Wraps already-materialized rows.
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows, pos: 0 }
    }
}

impl Rows for BufferedRows {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn rewindable(&self) -> bool {
        true
    }

    fn seek(&mut self, pos: usize) -> Result<(), EngineError> {
        if pos > self.rows.len() {
            return Err(EngineError::new(
                None,
                format!("seek to row {pos} past the end of a {}-row result", self.rows.len()),
            ));
        }
        self.pos = pos;
        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<Row>, EngineError> {
        match self.rows.get(self.pos) {
            Some(row) => {
                self.pos += 1;
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>, EngineError> {
        let rest = self.rows[self.pos..].to_vec();
        self.pos = self.rows.len();
        Ok(rest)
    }
}
