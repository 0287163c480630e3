//! # basalt-orm
//!
//! Active-record object mapping over `basalt-sql-core`.
//!
//! This crate provides:
//! - The [`Entity`] trait describing a mapped table (name, primary key,
//!   serialize-designated fields, lifecycle hooks)
//! - [`Record<E>`], the active record: an attribute map with dirty
//!   tracking, a lazy serialize/deserialize cache, and the
//!   create/update/delete lifecycle
//! - [`Finder<E>`] for primary-key and convenience lookups
//!
//! ## Quick start
//!
//! ```ignore
//! use basalt_orm::{Entity, Record};
//!
//! struct User;
//!
//! impl Entity for User {
//!     const TABLE: &'static str = "users";
//!     const SERIALIZED: &'static [&'static str] = &["profile"];
//! }
//!
//! let mut user = Record::<User>::new();
//! user.set("name", "Ann");
//! let id = user.create(&engine)?;
//!
//! let mut found = Record::<User>::find().by_id_or_fail(&engine, id)?;
//! found.set("name", "Jane");
//! found.update(&engine)?; // UPDATE touches only `name`
//! ```
//!
//! Records hydrated from rows track exactly which fields were written with
//! a different value since load, so `update` emits minimal SQL — and emits
//! none at all when nothing changed.

mod entity;
mod error;
mod finder;
mod record;

pub use entity::{Entity, RecordState};
pub use error::{OrmError, Result};
pub use finder::Finder;
pub use record::Record;

// Re-export the commonly used query-layer types.
pub use basalt_sql_core::{Cond, Direction, Engine, Expr, Op, Query, Row, Value};
