//! majorka-storage: the analytical store seen from the importer.
//!
//! [`AnalyticalStore`] is the seam; [`HttpStore`] speaks SQL over HTTP and
//! [`MemoryStore`] interprets statements in process for tests.

pub mod conformance;
mod error;
mod http;
mod memory;
mod statement;
mod traits;

pub use error::StoreError;
pub use http::{HttpStore, StoreSettings, DEFAULT_DATABASE, DEFAULT_TIMEOUT, DEFAULT_URL};
pub use memory::{MemoryStore, MemoryTable};
pub use statement::{quote, split_statement, Query, SqlGenerator, Statement, TableDef, INDEX_GRANULARITY};
pub use traits::{read_cursor, read_typed, AnalyticalStore, Rows, TypedRow};
