use majorka_bus::BusError;
use majorka_core::{CodecError, DiffError, SchemaError, TsvError};
use majorka_storage::StoreError;

/// Everything that can abort the import of one entity kind.
///
/// Nothing here is retried by the importer: the run halts and an operator
/// (or scheduler) re-runs it after inspection. The cursor lives in the
/// destination table, so a re-run never duplicates rows.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bus(#[from] BusError),

    /// A record value does not fit its column's codec.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Rows failed the tab-separated safety checks.
    #[error(transparent)]
    ValueSafety(#[from] TsvError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    /// The merged schema would need a column in front of the table's first
    /// column. Cannot be expressed as "add after" steps.
    #[error(
        "schema conflict on table '{table}': existing columns start with '{existing_head}' but the merged schema starts with '{union_head}'"
    )]
    SchemaConflict {
        table: String,
        existing_head: String,
        union_head: String,
    },

    #[error("unknown entity kind '{kind}'; importable kinds: {}", .known.join(", "))]
    UnknownEntity { kind: String, known: Vec<String> },
}
