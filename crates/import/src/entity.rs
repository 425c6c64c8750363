//! The importable entity abstraction.

use std::collections::BTreeMap;

use majorka_bus::{BusError, RawRecord};
use majorka_core::{Column, EntityId, Record, Schema, SchemaError, Value, DATE_COLUMN, ID_COLUMN};
use serde::de::DeserializeOwned;
use time::Date;

/// An entity kind that can be imported: its bus kind, destination table and
/// statically declared fields.
pub trait Entity: DeserializeOwned {
    /// Bus key prefix, e.g. `Hits`.
    const KIND: &'static str;
    /// Destination table name.
    const TABLE: &'static str;

    /// Static fields, without the identity and creation columns.
    fn fields() -> Vec<Column>;

    /// Value of a static field.
    fn field(&self, name: &str) -> Option<Value>;

    /// Open attribute map, for kinds whose schema grows with the data.
    fn dimensions(&self) -> Option<&BTreeMap<String, String>> {
        None
    }

    /// Date the entity was created, when it carries one.
    fn created(&self) -> Option<Date> {
        None
    }

    fn schema() -> Result<Schema, SchemaError> {
        Schema::new(Self::fields())
    }
}

/// An entity read from the bus together with its identity.
#[derive(Debug, Clone)]
pub struct Stored<E> {
    pub id: EntityId,
    pub entity: E,
    /// Creation date for entities without one of their own.
    imported_on: Date,
}

impl<E: Entity> Stored<E> {
    pub fn new(id: EntityId, entity: E, imported_on: Date) -> Self {
        Stored {
            id,
            entity,
            imported_on,
        }
    }

    pub fn decode(raw: &RawRecord, imported_on: Date) -> Result<Self, BusError> {
        Ok(Stored::new(raw.id.clone(), raw.decode()?, imported_on))
    }
}

impl<E: Entity> Record for Stored<E> {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            ID_COLUMN => Some(Value::UInt(self.id.index)),
            DATE_COLUMN => Some(Value::Date(
                self.entity.created().unwrap_or(self.imported_on),
            )),
            _ => self.entity.field(name),
        }
    }

    fn dimensions(&self) -> Option<&BTreeMap<String, String>> {
        self.entity.dimensions()
    }
}
