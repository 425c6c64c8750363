//! Column descriptors, entity schemas and record-to-row translation.
//!
//! A [`Column`] pairs a name with a [`Codec`]. Columns compare equal by name
//! only: type changes are not modeled, so two schemas that differ only in a
//! column's type are considered identical by the migration planner.
//!
//! Every [`Schema`] starts with the identity column `id` and the creation
//! column `date_added`. Tables are ordered by that prefix, and the
//! [`StaticFirst`] ordering keeps it (and the rest of the static fields) in
//! front of any dimension column.

use std::cmp::Ordering;
use std::fmt;

use crate::codec::{Codec, CodecError};
use crate::record::Record;
use crate::registry::codec_for_type;

/// Identity column; holds the entity index.
pub const ID_COLUMN: &str = "id";

/// Creation column; `Date DEFAULT today()` in DDL.
pub const DATE_COLUMN: &str = "date_added";

/// Prefix of columns fed from a record's open attribute map.
pub const DIMENSION_PREFIX: &str = "dim_";

// ──────────────────────────────────────────────
// Column
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub codec: Codec,
}

impl Column {
    pub fn new(name: impl Into<String>, codec: Codec) -> Self {
        Column {
            name: name.into(),
            codec,
        }
    }

    /// The `dim_<key>` column reading `key` from a record's attribute map.
    pub fn dimension(key: &str) -> Self {
        Column::new(format!("{}{}", DIMENSION_PREFIX, key), Codec::dimension(key))
    }

    pub fn is_dimension(&self) -> bool {
        matches!(self.codec, Codec::Dimension(_))
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Column {}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Columns from explicit `(name, codec)` pairs.
pub fn columns<N: Into<String>>(pairs: impl IntoIterator<Item = (N, Codec)>) -> Vec<Column> {
    pairs
        .into_iter()
        .map(|(name, codec)| Column::new(name, codec))
        .collect()
}

/// Columns from bare field names; every codec is `String`.
pub fn columns_from_names<N: AsRef<str>>(names: &[N]) -> Vec<Column> {
    names
        .iter()
        .map(|name| Column::new(name.as_ref(), Codec::String))
        .collect()
}

/// Columns inferred from `(name, type)` pairs as reported by `DESCRIBE`.
pub fn columns_from_description(described: &[(String, String)]) -> Vec<Column> {
    described
        .iter()
        .map(|(name, type_name)| Column::new(name.as_str(), codec_for_type(type_name)))
        .collect()
}

/// Encode `record` into a wire row ordered like `columns`.
pub fn row_for<R: Record + ?Sized>(record: &R, columns: &[Column]) -> Result<Vec<String>, CodecError> {
    columns
        .iter()
        .map(|column| column.codec.encode_field(&column.name, record))
        .collect()
}

// ──────────────────────────────────────────────
// Schema
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("schema must start with '{expected}', found '{found}'")]
    MissingPrefix { expected: String, found: String },
}

/// The statically declared columns of one entity kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Build a schema from an entity's own fields, prefixed with the
    /// identity and creation columns.
    pub fn new(fields: Vec<Column>) -> Result<Self, SchemaError> {
        let mut columns = Vec::with_capacity(fields.len() + 2);
        columns.push(Column::new(ID_COLUMN, Codec::UInt64));
        columns.push(Column::new(DATE_COLUMN, Codec::Date));
        columns.extend(fields);
        Schema::from_columns(columns)
    }

    /// Validate a full column list: the prefix must be present and names unique.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, SchemaError> {
        for (position, expected) in [ID_COLUMN, DATE_COLUMN].iter().enumerate() {
            let found = columns.get(position).map(|c| c.name.as_str()).unwrap_or("");
            if found != *expected {
                return Err(SchemaError::MissingPrefix {
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(SchemaError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Schema { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Static columns followed by one dimension column per attribute the
    /// record carries, in key order.
    pub fn declared_columns<R: Record + ?Sized>(&self, record: &R) -> Vec<Column> {
        let mut declared = self.columns.clone();
        if let Some(dims) = record.dimensions() {
            declared.extend(dims.keys().map(|key| Column::dimension(key)));
        }
        declared
    }

    /// Bind described table columns to codecs. Static columns keep the
    /// schema's codec, `dim_*` columns become dimension codecs and the rest
    /// go through the registry.
    pub fn resolve(&self, described: &[(String, String)]) -> Vec<Column> {
        described
            .iter()
            .map(|(name, type_name)| {
                if let Some(column) = self.get(name) {
                    column.clone()
                } else if let Some(key) = name.strip_prefix(DIMENSION_PREFIX) {
                    Column::dimension(key)
                } else {
                    Column::new(name.as_str(), codec_for_type(type_name))
                }
            })
            .collect()
    }

    /// The migration ordering for this schema.
    pub fn ordering(&self) -> StaticFirst {
        StaticFirst {
            statics: self.columns.iter().map(|c| c.name.clone()).collect(),
        }
    }
}

/// Column ordering: static columns by declaration position, then everything
/// else lexicographically by name.
#[derive(Debug, Clone)]
pub struct StaticFirst {
    statics: Vec<String>,
}

impl StaticFirst {
    fn rank(&self, column: &Column) -> usize {
        self.statics
            .iter()
            .position(|name| *name == column.name)
            .unwrap_or(usize::MAX)
    }

    pub fn compare(&self, a: &Column, b: &Column) -> Ordering {
        self.rank(a)
            .cmp(&self.rank(b))
            .then_with(|| a.name.cmp(&b.name))
    }
}
