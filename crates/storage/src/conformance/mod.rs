//! Conformance test suite for `AnalyticalStore` implementations.
//!
//! Backend-agnostic checks that the importer's assumptions hold for a store:
//!
//! - **DDL**: table creation, describe order, column addition after a named
//!   predecessor, duplicate-column rejection
//! - **Load**: bulk inserts, cursor discovery, missing-table errors
//!
//! # Usage
//!
//! Call [`run_conformance_suite`] with a factory that creates a fresh, empty
//! store for each test:
//!
//! ```ignore
//! use majorka_storage::{conformance::run_conformance_suite, MemoryStore};
//!
//! #[test]
//! fn memory_conformance() {
//!     let report = run_conformance_suite(|| MemoryStore::new("test"));
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod ddl;
mod load;

use std::fmt;

use majorka_core::{Codec, Column, Schema};

use crate::statement::{Statement, TableDef};
use crate::AnalyticalStore;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category ("ddl" or "load").
    pub category: String,
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a store backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// store, ensuring test isolation.
pub fn run_conformance_suite<S, F>(factory: F) -> ConformanceReport
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut results = Vec::new();

    results.extend(ddl::run_ddl_tests(&factory));
    results.extend(load::run_load_tests(&factory));

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const TABLE: &str = "conformance_events";

fn event_schema() -> Result<Schema, String> {
    Schema::new(vec![
        Column::new("name", Codec::String),
        Column::new("amount", Codec::Money),
    ])
    .map_err(|e| e.to_string())
}

fn create_events<S: AnalyticalStore>(store: &mut S) -> Result<(), String> {
    store
        .write(&Statement::CreateTable(TableDef {
            name: TABLE.to_string(),
            columns: event_schema()?.columns().to_vec(),
        }))
        .map_err(|e| format!("create table failed: {}", e))
}

fn insert_events<S: AnalyticalStore>(store: &mut S, payload: &str) -> Result<(), String> {
    store
        .write(&Statement::Insert {
            table: TABLE.to_string(),
            columns: vec![
                "id".to_string(),
                "date_added".to_string(),
                "name".to_string(),
                "amount".to_string(),
            ],
            payload: payload.to_string(),
        })
        .map_err(|e| format!("insert failed: {}", e))
}

fn column_names<S: AnalyticalStore>(store: &mut S) -> Result<Vec<String>, String> {
    store
        .describe(TABLE)
        .map(|cols| cols.into_iter().map(|(name, _)| name).collect())
        .map_err(|e| format!("describe failed: {}", e))
}
