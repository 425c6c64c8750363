//! Incremental import of one entity kind from the bus into its table.
//!
//! One pass:
//! 1. read the table's cursor (highest imported id), creating the table
//!    when it does not exist yet;
//! 2. load bus records after the cursor, up to the batch limit;
//! 3. grow the table for attributes it has not seen (dimension kinds only);
//! 4. bulk-insert the batch as tab-separated rows.
//!
//! The cursor lives in the table itself, so a failed pass can simply be
//! re-run: nothing before the failing step has moved it.

use std::fmt;

use majorka_bus::{BusBackend, EventBus};
use majorka_core::{row_for, tsv, Record};
use majorka_storage::{read_cursor, AnalyticalStore, Statement, StoreError, TableDef};
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::entity::{Entity, Stored};
use crate::error::ImportError;
use crate::events::{EventSink, ImportEvent};
use crate::migration::plan_migration;
use crate::models::{Campaign, Conversion, Hit, Offer, KNOWN_KINDS};

/// Outcome of one import pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub kind: String,
    pub table: String,
    pub cursor_before: Option<u64>,
    pub table_created: bool,
    pub columns_added: Vec<String>,
    pub rows_inserted: usize,
    pub cursor_after: Option<u64>,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {} row(s)", self.kind, self.table, self.rows_inserted)?;
        if self.table_created {
            write!(f, ", table created")?;
        }
        if !self.columns_added.is_empty() {
            write!(f, ", added {}", self.columns_added.join(", "))?;
        }
        match self.cursor_after {
            Some(c) => write!(f, ", cursor at {}", c),
            None => write!(f, ", empty"),
        }
    }
}

pub struct Importer<B, S> {
    bus: EventBus<B>,
    store: S,
    batch_limit: Option<u64>,
    today: Date,
}

impl<B: BusBackend, S: AnalyticalStore> Importer<B, S> {
    pub fn new(bus: EventBus<B>, store: S) -> Self {
        Importer {
            bus,
            store,
            batch_limit: None,
            today: OffsetDateTime::now_utc().date(),
        }
    }

    /// Load at most `limit` records per pass. Zero means unlimited.
    pub fn with_batch_limit(mut self, limit: Option<u64>) -> Self {
        self.batch_limit = limit.filter(|&n| n > 0);
        self
    }

    /// Creation date for entities that do not carry their own.
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = today;
        self
    }

    pub fn bus(&self) -> &EventBus<B> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus<B> {
        &mut self.bus
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Import the kind named `kind` as stored on the bus.
    pub fn import_kind(
        &mut self,
        kind: &str,
        sink: &mut dyn EventSink,
    ) -> Result<ImportReport, ImportError> {
        match kind {
            Campaign::KIND => self.import::<Campaign>(sink),
            Offer::KIND => self.import::<Offer>(sink),
            Conversion::KIND => self.import::<Conversion>(sink),
            Hit::KIND => self.import::<Hit>(sink),
            _ => Err(ImportError::UnknownEntity {
                kind: kind.to_string(),
                known: KNOWN_KINDS.iter().map(|k| k.to_string()).collect(),
            }),
        }
    }

    pub fn import<E: Entity>(
        &mut self,
        sink: &mut dyn EventSink,
    ) -> Result<ImportReport, ImportError> {
        let schema = E::schema()?;
        self.store.ping()?;

        let mut report = ImportReport {
            kind: E::KIND.to_string(),
            table: E::TABLE.to_string(),
            cursor_before: None,
            table_created: false,
            columns_added: Vec::new(),
            rows_inserted: 0,
            cursor_after: None,
        };

        // ── Cursor ────────────────────────────────────────────────────────
        let cursor = match read_cursor(&mut self.store, E::TABLE) {
            Ok(cursor) => cursor,
            Err(StoreError::Statement { response, .. }) => {
                tracing::debug!(table = E::TABLE, %response, "cursor query failed, creating table");
                self.store.write(&Statement::CreateTable(TableDef {
                    name: E::TABLE.to_string(),
                    columns: schema.columns().to_vec(),
                }))?;
                report.table_created = true;
                sink.emit(&ImportEvent::TableCreated {
                    kind: E::KIND.to_string(),
                    table: E::TABLE.to_string(),
                });
                None
            }
            Err(e) => return Err(e.into()),
        };
        report.cursor_before = cursor;
        report.cursor_after = cursor;

        // ── Load ──────────────────────────────────────────────────────────
        let start = cursor.map_or(0, |c| c + 1);
        let end = self.batch_limit.map(|n| start + n - 1);
        let mut records: Vec<Stored<E>> = Vec::new();
        for raw in self.bus.multiread(E::KIND, start, end)? {
            records.push(Stored::decode(&raw?, self.today)?);
        }
        let last_id = match records.last() {
            Some(record) => record.id().index,
            None => {
                sink.emit(&ImportEvent::UpToDate {
                    kind: E::KIND.to_string(),
                    cursor,
                });
                return Ok(report);
            }
        };
        sink.emit(&ImportEvent::RecordsLoaded {
            kind: E::KIND.to_string(),
            from: start,
            count: records.len(),
        });

        // ── Migrate ───────────────────────────────────────────────────────
        let mut columns = schema.resolve(&self.store.describe(E::TABLE)?);
        if records.iter().any(|r| r.dimensions().is_some()) {
            let plan = plan_migration(E::TABLE, &columns, &schema, &records)?;
            if !plan.is_empty() {
                sink.emit(&ImportEvent::MigrationPlanned {
                    table: E::TABLE.to_string(),
                    columns: plan.iter().map(|s| s.item.name.clone()).collect(),
                });
                for step in &plan {
                    self.store.write(&Statement::AddColumn {
                        table: E::TABLE.to_string(),
                        column: step.item.clone(),
                        after: step.after.name.clone(),
                    })?;
                    report.columns_added.push(step.item.name.clone());
                    sink.emit(&ImportEvent::ColumnAdded {
                        table: E::TABLE.to_string(),
                        column: step.item.name.clone(),
                        column_type: step.item.codec.wire_type_name(),
                        after: step.after.name.clone(),
                    });
                }
                columns = schema.resolve(&self.store.describe(E::TABLE)?);
            }
        }

        // ── Insert ────────────────────────────────────────────────────────
        let rows = records
            .iter()
            .map(|r| row_for(r, &columns))
            .collect::<Result<Vec<_>, _>>()?;
        let payload = tsv::render(&rows)?;
        self.store.write(&Statement::Insert {
            table: E::TABLE.to_string(),
            columns: columns.iter().map(|c| c.name.clone()).collect(),
            payload,
        })?;

        report.rows_inserted = rows.len();
        report.cursor_after = Some(last_id);
        sink.emit(&ImportEvent::RowsInserted {
            table: E::TABLE.to_string(),
            rows: rows.len(),
            last_id,
        });
        Ok(report)
    }
}
