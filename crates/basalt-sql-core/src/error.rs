//! Error types for the query layer.

use thiserror::Error;

/// A failure reported by a database engine.
///
/// Carries the driver's error code when the driver reported one, so callers
/// can diagnose a failed statement without re-running it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    code: Option<i32>,
    message: String,
}

impl EngineError {
    /// Creates an engine error from a driver code and message.
    pub fn new(code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The driver error code, if one was reported.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        self.code
    }

    /// The driver error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors produced while building, quoting, executing, or reading queries.
///
/// Execution failures are never retried here: the common causes (bad SQL,
/// constraint violation, lost connection) are not transiently recoverable at
/// this level, so they propagate to the caller wrapped with the offending
/// SQL text.
#[derive(Debug, Error)]
pub enum Error {
    /// The builder state does not describe a complete statement. A
    /// programming error; fails fast instead of emitting invalid SQL.
    #[error("cannot build query: {0}")]
    QueryBuild(String),

    /// The engine's string-escaping primitive failed.
    #[error("failed to quote value: {0}")]
    Quoting(#[source] EngineError),

    /// The engine rejected a statement.
    #[error("error executing `{sql}`: {source}")]
    Execute {
        /// The SQL text handed to the engine.
        sql: String,
        /// The underlying driver failure.
        source: EngineError,
    },

    /// A row fetch failed. The cursor position is undefined afterwards and
    /// iteration must not continue.
    #[error("result fetch failed: {0}")]
    Cursor(#[source] EngineError),

    /// The requested column does not exist in the result schema. Distinct
    /// from a column that is present but NULL.
    #[error("no such column: `{0}`")]
    FieldNotFound(String),
}

/// Result alias for query-layer operations.
pub type Result<T> = std::result::Result<T, Error>;
