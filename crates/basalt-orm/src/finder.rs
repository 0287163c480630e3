//! Primary-key and convenience lookups.

use std::marker::PhantomData;

use basalt_sql_core::{Cond, Engine, Query, Value};

use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::record::Record;

/// Lookup helper for one entity type.
///
/// Finders are lightweight and can be created freely; the usual entry point
/// is [`Record::find`].
pub struct Finder<E: Entity> {
    _entity: PhantomData<E>,
}

impl<E: Entity> Finder<E> {
    /// Creates a finder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }

    /// A SELECT over the entity's table, ready for more clauses.
    #[must_use]
    pub fn query(&self) -> Query {
        Query::select().from(E::TABLE)
    }

    /// Looks up one record by primary key.
    ///
    /// `None` when no row matches — the absent-value sentinel, never an
    /// error.
    pub fn by_id(&self, engine: &dyn Engine, id: impl Into<Value>) -> Result<Option<Record<E>>> {
        let row = self
            .query()
            .filter(Cond::eq(E::PRIMARY_KEY, id))
            .one(engine)?;
        Ok(row.map(|row| Record::hydrate(&row)))
    }

    /// Looks up one record by primary key, failing when no row matches.
    pub fn by_id_or_fail(&self, engine: &dyn Engine, id: impl Into<Value>) -> Result<Record<E>> {
        let id = id.into();
        self.by_id(engine, id.clone())?
            .ok_or_else(|| OrmError::RecordNotFound {
                table: E::TABLE,
                id: id_text(&id),
            })
    }

    /// The first record matching `cond`, `None` when nothing matches.
    pub fn first(&self, engine: &dyn Engine, cond: Cond) -> Result<Option<Record<E>>> {
        let row = self.query().filter(cond).one(engine)?;
        Ok(row.map(|row| Record::hydrate(&row)))
    }

    /// Every record, optionally filtered.
    pub fn all(&self, engine: &dyn Engine, cond: Option<Cond>) -> Result<Vec<Record<E>>> {
        let mut query = self.query();
        if let Some(cond) = cond {
            query = query.filter(cond);
        }
        Ok(query.all_as(engine)?)
    }

    /// Counts records, optionally filtered.
    pub fn count(&self, engine: &dyn Engine, cond: Option<Cond>) -> Result<i64> {
        let mut query = self.query();
        if let Some(cond) = cond {
            query = query.filter(cond);
        }
        Ok(query.count(engine)?)
    }

    /// True when at least one record matches `cond`.
    pub fn exists(&self, engine: &dyn Engine, cond: Cond) -> Result<bool> {
        Ok(self.count(engine, Some(cond))? > 0)
    }
}

impl<E: Entity> Default for Finder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Clone for Finder<E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<E: Entity> Copy for Finder<E> {}

fn id_text(id: &Value) -> String {
    match id {
        Value::Int(n) => n.to_string(),
        Value::Text(s) => s.clone(),
        other => format!("{other:?}"),
    }
}
