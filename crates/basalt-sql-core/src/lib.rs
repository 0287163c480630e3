//! # basalt-sql-core
//!
//! SQL query building, inline-literal compilation, and result cursors.
//!
//! This crate provides:
//! - A fluent [`Query`] builder that accumulates clause state and compiles
//!   it to SQL in a fixed clause order
//! - Injection-safe quoting: every value goes through one quoter, every
//!   identifier through the backtick-quoting algorithm
//! - The [`Engine`] collaborator trait the compiled SQL is handed to, and
//!   the [`Cursor`] adapter over the rows it returns
//!
//! The crate owns no transport. Statements execute through whatever
//! [`Engine`] implementation the caller supplies and block until the engine
//! responds; failures propagate unretried.
//!
//! ## Building queries
//!
//! ```ignore
//! use basalt_sql_core::{Cond, Direction, Query};
//!
//! let admins = Query::select()
//!     .columns(["id", "name"])
//!     .from("users")
//!     .filter(Cond::eq("role", "admin").and(Cond::is_null("deleted_at")))
//!     .order_by("name", Direction::Asc)
//!     .limit(20)
//!     .all(&engine)?;
//! ```
//!
//! ## Injection safety
//!
//! Values are never concatenated into SQL text directly; they are rendered
//! by the value quoter, which delegates string escaping to the engine:
//!
//! ```ignore
//! let q = Query::select()
//!     .from("users")
//!     .filter(Cond::eq("name", "'; DROP TABLE users; --"));
//! // compiles to: SELECT * FROM `users` WHERE `name` = '''; DROP TABLE users; --'
//! ```

mod compile;
pub mod cond;
pub mod cursor;
pub mod engine;
mod error;
pub mod expr;
pub mod query;
pub mod quote;
pub mod row;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use cond::{Cond, Op};
pub use cursor::{Cursor, ListSeed};
pub use engine::{BufferedRows, Engine, Rows};
pub use error::{EngineError, Error, Result};
pub use expr::Expr;
pub use query::{Direction, Join, JoinKind, Query, QueryKind};
pub use quote::{quote_column, quote_identifier, quote_table, quote_value, SqlRef};
pub use row::{FromRow, Row};
pub use value::Value;
