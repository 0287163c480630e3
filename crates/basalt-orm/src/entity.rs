//! Entity descriptors and the record lifecycle states.

use crate::record::Record;

/// Persistence state of a record.
///
/// The explicit rendition of a tri-state loaded flag: a record is being
/// hydrated, exists only in memory, or is backed by a database row. Keeping
/// the states as an enum makes the illegal transitions (say, `update` on a
/// record that was never persisted) rejectable up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Being filled from a raw row; writes bypass change tracking.
    Constructing,
    /// In memory only; `create` will INSERT it.
    New,
    /// Backed by a row; writes are change-tracked, `update`/`delete` work.
    Persisted,
}

/// Static description of a mapped table, plus lifecycle hooks.
///
/// Implementations are zero-sized marker types; the data lives in
/// [`Record<E>`]. Hooks default to no-ops. The `before_*` pair may veto the
/// operation by returning `false`, which short-circuits into a no-op result
/// rather than an error.
///
/// # Example
///
/// ```
/// use basalt_orm::Entity;
///
/// struct User;
///
/// impl Entity for User {
///     const TABLE: &'static str = "users";
///     const SERIALIZED: &'static [&'static str] = &["profile"];
/// }
/// ```
pub trait Entity: Sized + 'static {
    /// Table name.
    const TABLE: &'static str;

    /// Primary key column.
    const PRIMARY_KEY: &'static str = "id";

    /// Fields stored as JSON text and decoded lazily on first read.
    const SERIALIZED: &'static [&'static str] = &[];

    /// Runs before `create`; returning `false` vetoes the INSERT.
    fn before_create(_record: &mut Record<Self>) -> bool {
        true
    }

    /// Runs after a successful `create`.
    fn after_create(_record: &mut Record<Self>) {}

    /// Runs before `update`; returning `false` vetoes the UPDATE.
    fn before_update(_record: &mut Record<Self>) -> bool {
        true
    }

    /// Runs after a successful `update`.
    fn after_update(_record: &mut Record<Self>) {}

    /// Runs after a successful `delete`.
    fn after_delete(_record: &mut Record<Self>) {}

    /// Runs after any successful write (`create` or `update`).
    fn after_change(_record: &mut Record<Self>) {}
}
