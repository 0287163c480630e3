//! The active record: attribute map, dirty tracking, serialize cache, and
//! the create/update/delete lifecycle.

use std::collections::{BTreeSet, HashMap};
use std::marker::PhantomData;

use basalt_sql_core::{Cond, Engine, Error as SqlError, FromRow, Query, Row, Value};

use crate::entity::{Entity, RecordState};
use crate::error::{OrmError, Result};
use crate::finder::Finder;

/// A database-backed object for entity `E`.
///
/// Attributes live in an ordered field-name-to-value map; entities declare
/// typed getters/setters over it (see the integration tests for the
/// pattern). While the record is [`RecordState::Persisted`], writes are
/// change-tracked so `update` touches exactly the fields that differ from
/// what was loaded.
///
/// Two records hydrated from the same row are independent in-memory copies.
/// There is no identity map: concurrent mutation of two copies loses one
/// side's update (last `update` wins).
pub struct Record<E: Entity> {
    attributes: Vec<(String, Value)>,
    changed: BTreeSet<String>,
    cache: HashMap<String, serde_json::Value>,
    state: RecordState,
    _entity: PhantomData<E>,
}

impl<E: Entity> Record<E> {
    /// Creates an unsaved record with no attributes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
            changed: BTreeSet::new(),
            cache: HashMap::new(),
            state: RecordState::New,
            _entity: PhantomData,
        }
    }

    /// Hydrates a record from a result row.
    ///
    /// Field assignment happens in the Constructing state, so no change
    /// tracking fires; the result is Persisted with an empty changed set.
    #[must_use]
    pub fn hydrate(row: &Row) -> Self {
        let mut record = Self::new();
        record.state = RecordState::Constructing;
        for (name, value) in row.iter() {
            record.set(name, value.clone());
        }
        record.state = RecordState::Persisted;
        record
    }

    /// A lookup helper for this entity.
    #[must_use]
    pub fn find() -> Finder<E> {
        Finder::new()
    }

    /// The record's lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RecordState {
        self.state
    }

    /// True when the record is backed by a database row.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.state == RecordState::Persisted
    }

    /// The raw attribute value, or `None` when the field was never set.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// The primary key value, when set.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.get(E::PRIMARY_KEY)
    }

    /// Writes a raw attribute value.
    ///
    /// While Constructing the write bypasses change tracking (hydration
    /// path). While Persisted, a value different from the stored one marks
    /// the field changed; rewriting an equal value does not dirty the
    /// record.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.state {
            RecordState::Constructing | RecordState::New => self.put(field, value),
            RecordState::Persisted => {
                if self.get(field) != Some(&value) {
                    self.put(field, value);
                    self.changed.insert(String::from(field));
                }
            }
        }
    }

    fn put(&mut self, field: &str, value: Value) {
        match self.attributes.iter_mut().find(|(name, _)| name == field) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((String::from(field), value)),
        }
    }

    /// Stages a decoded structure for a serialize-designated field.
    ///
    /// Nothing is encoded yet. `create`/`update` encode pending entries,
    /// and only a value whose encoding differs from the stored text marks
    /// the field changed.
    ///
    /// # Panics
    ///
    /// If `field` is not in `E::SERIALIZED`.
    pub fn set_serialized(&mut self, field: &str, value: serde_json::Value) {
        assert!(
            E::SERIALIZED.contains(&field),
            "`{field}` is not a serialized field of `{}`",
            E::TABLE
        );
        self.cache.insert(String::from(field), value);
    }

    /// The decoded structure of a serialize-designated field.
    ///
    /// The first read decodes the stored JSON text once and caches it;
    /// later reads (and values staged by `set_serialized`) come from the
    /// cache without re-decoding. A missing or NULL attribute decodes to
    /// JSON null.
    ///
    /// # Panics
    ///
    /// If `field` is not in `E::SERIALIZED`, or the stored raw value is
    /// neither NULL nor text (a storage invariant violation).
    pub fn get_serialized(&mut self, field: &str) -> Result<&serde_json::Value> {
        assert!(
            E::SERIALIZED.contains(&field),
            "`{field}` is not a serialized field of `{}`",
            E::TABLE
        );
        if !self.cache.contains_key(field) {
            let decoded = match self.get(field) {
                None | Some(Value::Null) => serde_json::Value::Null,
                Some(Value::Text(raw)) => serde_json::from_str(raw)?,
                Some(other) => {
                    panic!("serialized field `{field}` holds a non-text value: {other:?}")
                }
            };
            self.cache.insert(String::from(field), decoded);
        }
        Ok(&self.cache[field])
    }

    /// Encodes pending serialize-cache entries into their attribute slots.
    ///
    /// A value that round-trips to the identical stored text is left
    /// untouched, so an unchanged cached field never dirties the record.
    fn flush_serialized(&mut self) -> Result<()> {
        for field in E::SERIALIZED {
            let Some(decoded) = self.cache.get(*field) else {
                continue;
            };
            let encoded = serde_json::to_string(decoded)?;
            let same = matches!(self.get(field), Some(Value::Text(stored)) if *stored == encoded);
            if !same {
                self.put(field, Value::Text(encoded));
                if self.state == RecordState::Persisted {
                    self.changed.insert(String::from(*field));
                }
            }
        }
        Ok(())
    }

    /// Fields changed since load, in sorted order.
    pub fn changed_fields(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    /// True when `field` is marked changed.
    #[must_use]
    pub fn is_changed(&self, field: &str) -> bool {
        self.changed.contains(field)
    }

    /// True when at least one field is marked changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Attributes in order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Exports the attributes as a result row.
    #[must_use]
    pub fn to_row(&self) -> Row {
        Row::from_pairs(
            self.attributes
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        )
    }

    /// INSERTs the record and transitions it to Persisted.
    ///
    /// Pending serialize-cache entries are encoded first, then every
    /// current attribute is inserted. On success the engine-issued
    /// identifier is stored into the primary-key attribute and returned.
    /// A pre-create hook veto returns 0 without touching storage.
    pub fn create(&mut self, engine: &dyn Engine) -> Result<i64> {
        if self.state != RecordState::New {
            return Err(OrmError::NotPersistable);
        }
        if !E::before_create(self) {
            return Ok(0);
        }
        self.flush_serialized()?;

        let id = Query::insert(E::TABLE)
            .values_map(
                self.attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            )
            .execute(engine)?;

        self.state = RecordState::Persisted;
        self.put(E::PRIMARY_KEY, Value::Int(id));
        E::after_create(self);
        E::after_change(self);
        self.changed.clear();
        Ok(id)
    }

    /// UPDATEs exactly the changed fields, keyed by primary key.
    ///
    /// Serialize-cache entries are encoded before the empty-check, so a
    /// change hidden inside a decoded field is still detected. An empty
    /// changed set is a no-op returning 0 without issuing SQL, as is a
    /// pre-update hook veto.
    pub fn update(&mut self, engine: &dyn Engine) -> Result<u64> {
        if self.state != RecordState::Persisted {
            return Err(OrmError::NotLoaded);
        }
        self.flush_serialized()?;
        if self.changed.is_empty() {
            return Ok(0);
        }
        if !E::before_update(self) {
            return Ok(0);
        }

        let id = self.require_id()?;
        let assignments: Vec<(String, Value)> = self
            .changed
            .iter()
            .map(|field| {
                (
                    field.clone(),
                    self.get(field).cloned().unwrap_or(Value::Null),
                )
            })
            .collect();
        let affected = Query::update(E::TABLE)
            .set_map(assignments)
            .filter(Cond::eq(E::PRIMARY_KEY, id))
            .execute(engine)?;

        E::after_update(self);
        E::after_change(self);
        self.changed.clear();
        Ok(u64::try_from(affected).unwrap_or(0))
    }

    /// DELETEs the backing row and detaches the record.
    ///
    /// The in-memory attributes stay readable afterwards, but the record
    /// must be re-created before it can be updated again.
    pub fn delete(&mut self, engine: &dyn Engine) -> Result<u64> {
        if self.state != RecordState::Persisted {
            return Err(OrmError::NotLoaded);
        }
        let id = self.require_id()?;
        let affected = Query::delete(E::TABLE)
            .filter(Cond::eq(E::PRIMARY_KEY, id))
            .execute(engine)?;
        self.state = RecordState::New;
        E::after_delete(self);
        Ok(u64::try_from(affected).unwrap_or(0))
    }

    /// Creates when New, updates when Persisted.
    pub fn save(&mut self, engine: &dyn Engine) -> Result<()> {
        match self.state {
            RecordState::New => {
                self.create(engine)?;
                Ok(())
            }
            RecordState::Persisted => {
                self.update(engine)?;
                Ok(())
            }
            RecordState::Constructing => Err(OrmError::NotLoaded),
        }
    }

    fn require_id(&self) -> Result<Value> {
        self.id()
            .cloned()
            .ok_or_else(|| OrmError::Sql(SqlError::FieldNotFound(String::from(E::PRIMARY_KEY))))
    }
}

impl<E: Entity> Default for Record<E> {
    fn default() -> Self {
        Self::new()
    }
}

// Manual Debug to avoid an `E: Debug` bound on the marker type.
impl<E: Entity> std::fmt::Debug for Record<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("attributes", &self.attributes)
            .field("changed", &self.changed)
            .field("cache", &self.cache)
            .field("state", &self.state)
            .finish()
    }
}

// Manual Clone to avoid an `E: Clone` bound on the marker type.
impl<E: Entity> Clone for Record<E> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            changed: self.changed.clone(),
            cache: self.cache.clone(),
            state: self.state,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> FromRow for Record<E> {
    fn from_row(row: &Row) -> basalt_sql_core::Result<Self> {
        Ok(Self::hydrate(row))
    }
}
