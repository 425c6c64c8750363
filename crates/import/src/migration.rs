//! Migration planning: fold a batch's declared columns into the table's
//! current columns, then describe the result as one list of "add after"
//! steps.
//!
//! Folding first and diffing once keeps the number of ALTER statements at
//! one per genuinely new column, however many records introduce it.

use majorka_core::{apply, diff, Column, DiffError, Insertion, Record, Schema};

use crate::error::ImportError;

/// Ordered column additions turning `current` into a table that can hold
/// every record in `records`. Empty when nothing is new.
pub fn plan_migration<R: Record>(
    table: &str,
    current: &[Column],
    schema: &Schema,
    records: &[R],
) -> Result<Vec<Insertion<Column>>, ImportError> {
    let ordering = schema.ordering();
    let order = |a: &Column, b: &Column| ordering.compare(a, b);

    let mut merged = current.to_vec();
    for record in records {
        let declared = schema.declared_columns(record);
        let patch = diff(&merged, &declared, order).map_err(|e| conflict(table, e))?;
        if !patch.is_empty() {
            merged = apply(&merged, &patch)?;
        }
    }
    diff(current, &merged, order).map_err(|e| conflict(table, e))
}

fn conflict(table: &str, error: DiffError) -> ImportError {
    match error {
        DiffError::Undescribable {
            source_head,
            union_head,
        } => ImportError::SchemaConflict {
            table: table.to_string(),
            existing_head: source_head,
            union_head,
        },
        other => ImportError::Diff(other),
    }
}
