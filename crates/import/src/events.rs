//! Structured import events.
//!
//! The importer reports each state transition through an [`EventSink`]
//! supplied by the caller instead of logging on its own.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    TableCreated {
        kind: String,
        table: String,
    },
    RecordsLoaded {
        kind: String,
        from: u64,
        count: usize,
    },
    MigrationPlanned {
        table: String,
        columns: Vec<String>,
    },
    ColumnAdded {
        table: String,
        column: String,
        column_type: String,
        after: String,
    },
    RowsInserted {
        table: String,
        rows: usize,
        last_id: u64,
    },
    UpToDate {
        kind: String,
        cursor: Option<u64>,
    },
}

impl fmt::Display for ImportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportEvent::TableCreated { kind, table } => {
                write!(f, "created table '{}' for {}", table, kind)
            }
            ImportEvent::RecordsLoaded { kind, from, count } => {
                write!(f, "loaded {} {} record(s) from index {}", count, kind, from)
            }
            ImportEvent::MigrationPlanned { table, columns } => write!(
                f,
                "migration of '{}' adds {} column(s): {}",
                table,
                columns.len(),
                columns.join(", ")
            ),
            ImportEvent::ColumnAdded {
                table,
                column,
                column_type,
                after,
            } => write!(
                f,
                "added column '{}' {} to '{}' after '{}'",
                column, column_type, table, after
            ),
            ImportEvent::RowsInserted {
                table,
                rows,
                last_id,
            } => write!(f, "inserted {} row(s) into '{}' up to id {}", rows, table, last_id),
            ImportEvent::UpToDate { kind, cursor } => match cursor {
                Some(c) => write!(f, "{} is up to date at id {}", kind, c),
                None => write!(f, "{} has nothing to import", kind),
            },
        }
    }
}

/// Receives import events.
pub trait EventSink {
    fn emit(&mut self, event: &ImportEvent);
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &ImportEvent) {
        match event {
            ImportEvent::TableCreated { kind, table } => {
                tracing::info!(kind = %kind, table = %table, "table created");
            }
            ImportEvent::RecordsLoaded { kind, from, count } => {
                tracing::info!(kind = %kind, from, count, "records loaded");
            }
            ImportEvent::MigrationPlanned { table, columns } => {
                tracing::info!(table = %table, columns = ?columns, "migration planned");
            }
            ImportEvent::ColumnAdded {
                table,
                column,
                column_type,
                after,
            } => {
                tracing::info!(
                    table = %table,
                    column = %column,
                    column_type = %column_type,
                    after = %after,
                    "column added"
                );
            }
            ImportEvent::RowsInserted {
                table,
                rows,
                last_id,
            } => {
                tracing::info!(table = %table, rows, last_id, "rows inserted");
            }
            ImportEvent::UpToDate { kind, cursor } => {
                tracing::info!(kind = %kind, cursor = ?cursor, "up to date");
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub events: Vec<ImportEvent>,
}

impl EventSink for CollectingSink {
    fn emit(&mut self, event: &ImportEvent) {
        self.events.push(event.clone());
    }
}
