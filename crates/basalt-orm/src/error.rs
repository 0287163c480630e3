//! Error types for the active-record layer.

use thiserror::Error;

/// Errors from the active-record layer.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Query building, quoting, execution, or row access failed.
    #[error(transparent)]
    Sql(#[from] basalt_sql_core::Error),

    /// JSON (de)serialization of a serialize-designated field failed.
    #[error("serialized field error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// `update`/`delete` on a record that is not persisted.
    #[error("record is not loaded")]
    NotLoaded,

    /// `create` on a record that is already persisted.
    #[error("record is already persisted")]
    NotPersistable,

    /// `by_id_or_fail` found no matching row.
    #[error("no `{table}` record with id {id}")]
    RecordNotFound {
        /// Table that was searched.
        table: &'static str,
        /// The identifier that did not match.
        id: String,
    },
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;
