use super::{column_names, create_events, event_schema, TestResult, TABLE};
use crate::statement::Statement;
use crate::{AnalyticalStore, StoreError};
use majorka_core::Column;

pub(super) fn run_ddl_tests<S, F>(factory: &F) -> Vec<TestResult>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    vec![
        TestResult::from_result(
            "ddl",
            "describe_reports_declared_order",
            describe_reports_declared_order(factory),
        ),
        TestResult::from_result(
            "ddl",
            "describe_reports_wire_types",
            describe_reports_wire_types(factory),
        ),
        TestResult::from_result(
            "ddl",
            "create_table_is_idempotent",
            create_table_is_idempotent(factory),
        ),
        TestResult::from_result(
            "ddl",
            "add_column_lands_after_predecessor",
            add_column_lands_after_predecessor(factory),
        ),
        TestResult::from_result(
            "ddl",
            "add_existing_column_is_rejected",
            add_existing_column_is_rejected(factory),
        ),
        TestResult::from_result(
            "ddl",
            "describe_missing_table_is_statement_error",
            describe_missing_table_is_statement_error(factory),
        ),
    ]
}

fn describe_reports_declared_order<S, F>(factory: &F) -> Result<(), String>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut s = factory();
    create_events(&mut s)?;
    let names = column_names(&mut s)?;
    if names != ["id", "date_added", "name", "amount"] {
        return Err(format!("unexpected column order {:?}", names));
    }
    Ok(())
}

fn describe_reports_wire_types<S, F>(factory: &F) -> Result<(), String>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut s = factory();
    create_events(&mut s)?;
    let described = s.describe(TABLE).map_err(|e| e.to_string())?;
    let expected: Vec<(String, String)> = event_schema()?
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.codec.wire_type_name()))
        .collect();
    if described != expected {
        return Err(format!("expected {:?}, got {:?}", expected, described));
    }
    Ok(())
}

fn create_table_is_idempotent<S, F>(factory: &F) -> Result<(), String>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut s = factory();
    create_events(&mut s)?;
    create_events(&mut s)?;
    let names = column_names(&mut s)?;
    if names.len() != 4 {
        return Err(format!("expected 4 columns after recreate, got {:?}", names));
    }
    Ok(())
}

fn add_column_lands_after_predecessor<S, F>(factory: &F) -> Result<(), String>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut s = factory();
    create_events(&mut s)?;
    for (key, after) in [("os", "date_added"), ("zone", "dim_os")] {
        s.write(&Statement::AddColumn {
            table: TABLE.to_string(),
            column: Column::dimension(key),
            after: after.to_string(),
        })
        .map_err(|e| format!("add column {} failed: {}", key, e))?;
    }
    let names = column_names(&mut s)?;
    if names != ["id", "date_added", "dim_os", "dim_zone", "name", "amount"] {
        return Err(format!("unexpected column order {:?}", names));
    }
    Ok(())
}

fn add_existing_column_is_rejected<S, F>(factory: &F) -> Result<(), String>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut s = factory();
    create_events(&mut s)?;
    let add = Statement::AddColumn {
        table: TABLE.to_string(),
        column: Column::dimension("os"),
        after: "date_added".to_string(),
    };
    s.write(&add).map_err(|e| e.to_string())?;
    match s.write(&add) {
        Err(StoreError::Statement { .. }) => Ok(()),
        other => Err(format!("expected Statement error, got {:?}", other)),
    }
}

fn describe_missing_table_is_statement_error<S, F>(factory: &F) -> Result<(), String>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut s = factory();
    match s.describe("no_such_table") {
        Err(StoreError::Statement { .. }) => Ok(()),
        other => Err(format!("expected Statement error, got {:?}", other)),
    }
}
