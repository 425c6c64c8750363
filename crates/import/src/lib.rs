//! majorka-import: incremental bus-to-store import.
//!
//! - [`Importer`] -- one pass per entity kind: cursor, load, migrate, insert
//! - [`Entity`] and the [`models`] -- what can be imported and how it maps to rows
//! - [`plan_migration`] -- folds a batch's attributes into ordered column additions
//! - [`ImportConfig`] -- TOML configuration with environment overrides

pub mod config;
mod entity;
mod error;
pub mod events;
mod importer;
mod migration;
pub mod models;

pub use config::{read_config, ConfigError, ImportConfig};
pub use entity::{Entity, Stored};
pub use error::ImportError;
pub use events::{CollectingSink, EventSink, ImportEvent, TracingSink};
pub use importer::{ImportReport, Importer};
pub use migration::plan_migration;
pub use models::KNOWN_KINDS;
