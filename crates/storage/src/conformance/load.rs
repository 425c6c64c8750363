use super::{create_events, insert_events, TestResult, TABLE};
use crate::traits::{read_cursor, read_typed};
use crate::{AnalyticalStore, Query, StoreError};
use majorka_core::{Codec, Column, Value};

pub(super) fn run_load_tests<S, F>(factory: &F) -> Vec<TestResult>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    vec![
        TestResult::from_result(
            "load",
            "cursor_of_missing_table_is_statement_error",
            cursor_of_missing_table_is_statement_error(factory),
        ),
        TestResult::from_result(
            "load",
            "cursor_of_empty_table_is_none",
            cursor_of_empty_table_is_none(factory),
        ),
        TestResult::from_result(
            "load",
            "cursor_tracks_max_identity",
            cursor_tracks_max_identity(factory),
        ),
        TestResult::from_result(
            "load",
            "cursor_rows_carry_position",
            cursor_rows_carry_position(factory),
        ),
        TestResult::from_result(
            "load",
            "insert_into_missing_table_is_statement_error",
            insert_into_missing_table_is_statement_error(factory),
        ),
    ]
}

fn cursor_of_missing_table_is_statement_error<S, F>(factory: &F) -> Result<(), String>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut s = factory();
    match read_cursor(&mut s, "no_such_table") {
        Err(StoreError::Statement { .. }) => Ok(()),
        other => Err(format!("expected Statement error, got {:?}", other)),
    }
}

fn cursor_of_empty_table_is_none<S, F>(factory: &F) -> Result<(), String>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut s = factory();
    create_events(&mut s)?;
    match read_cursor(&mut s, TABLE) {
        Ok(None) => Ok(()),
        other => Err(format!("expected no cursor, got {:?}", other)),
    }
}

fn cursor_tracks_max_identity<S, F>(factory: &F) -> Result<(), String>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut s = factory();
    create_events(&mut s)?;
    insert_events(&mut s, "0\t2019-02-18\tfirst\t0.50000\n1\t2019-02-18\tsecond\t1.25000")?;
    insert_events(&mut s, "2\t2019-02-19\tthird\t0.00000")?;
    match read_cursor(&mut s, TABLE) {
        Ok(Some(2)) => Ok(()),
        other => Err(format!("expected cursor 2, got {:?}", other)),
    }
}

fn cursor_rows_carry_position<S, F>(factory: &F) -> Result<(), String>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut s = factory();
    create_events(&mut s)?;
    insert_events(&mut s, "0\t2019-02-18\tonly\t0.50000")?;
    let query = Query::Cursor {
        table: TABLE.to_string(),
    };
    let hints = [
        Column::new("count", Codec::UInt64),
        Column::new("max_id", Codec::UInt64),
    ];
    let rows: Vec<_> = read_typed(&mut s, &query, &hints)
        .map_err(|e| e.to_string())?
        .collect::<Result<_, _>>()
        .map_err(|e| e.to_string())?;
    match rows.as_slice() {
        [row] if row.index == 0 && row.total == 1 && row.values == [Value::UInt(1), Value::UInt(0)] => {
            Ok(())
        }
        other => Err(format!("unexpected cursor rows {:?}", other)),
    }
}

fn insert_into_missing_table_is_statement_error<S, F>(factory: &F) -> Result<(), String>
where
    S: AnalyticalStore,
    F: Fn() -> S,
{
    let mut s = factory();
    match insert_events(&mut s, "0\t2019-02-18\tx\t0.00000") {
        Err(msg) if msg.contains("insert failed") => Ok(()),
        Err(msg) => Err(msg),
        Ok(()) => Err("insert into a missing table succeeded".to_string()),
    }
}
