//! majorka-core: the typed heart of the reporting importer.
//!
//! Converts entity records into rows for a column-oriented analytical store
//! and plans append-only schema growth.
//!
//! # Public API
//!
//! - [`Codec`] / [`codec_for_type`] -- value codecs and the type-name registry
//! - [`tsv::render`] -- tab-separated bulk-load payloads
//! - [`Column`], [`Schema`], [`row_for`] -- column descriptors and row translation
//! - [`diff()`] / [`apply`] -- insertion-only diff/patch under a caller ordering
//! - [`EntityId`], [`Record`] -- entity identity and the row source abstraction

pub mod codec;
pub mod column;
pub mod diff;
pub mod record;
pub mod registry;
pub mod tsv;
pub mod value;

pub use codec::{Codec, CodecError, DecimalSpec, EnumVariant, MONEY_SCALE};
pub use column::{
    columns, columns_from_description, columns_from_names, row_for, Column, Schema, SchemaError,
    StaticFirst, DATE_COLUMN, DIMENSION_PREFIX, ID_COLUMN,
};
pub use diff::{apply, diff, DiffError, Insertion};
pub use record::{EntityId, IdentityError, Record};
pub use registry::codec_for_type;
pub use tsv::TsvError;
pub use value::Value;
