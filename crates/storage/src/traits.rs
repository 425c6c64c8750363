use majorka_core::{Codec, Column, Value};

use crate::error::StoreError;
use crate::statement::{Query, Statement};

/// The analytical store as seen by the importer.
///
/// Implementations talk to a column-oriented store through literal SQL
/// (see [`HttpStore`](crate::HttpStore)) or interpret statements in process
/// (see [`MemoryStore`](crate::MemoryStore)).
///
/// ## Failure classes
///
/// - `StoreError::Connectivity` when the store cannot be reached at all.
/// - `StoreError::Statement` when the store answers with an error, including
///   queries against tables that do not exist.
///
/// Callers rely on this split: a failed cursor query that is a `Statement`
/// error means "no table yet", a `Connectivity` error aborts the import.
pub trait AnalyticalStore {
    /// Health check. Fails with `Connectivity` if the store is unreachable.
    fn ping(&mut self) -> Result<(), StoreError>;

    /// Ordered `(name, type name)` pairs of a table's columns.
    fn describe(&mut self, table: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// Execute a DDL or DML statement.
    fn write(&mut self, statement: &Statement) -> Result<(), StoreError>;

    /// Run a query and return its raw wire rows.
    fn read(&mut self, query: &Query) -> Result<Vec<Vec<String>>, StoreError>;
}

/// One decoded result row with its position in the result set.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRow {
    pub values: Vec<Value>,
    pub index: usize,
    pub total: usize,
}

/// Iterator over decoded rows. Fields beyond the hints decode as text.
pub struct Rows {
    rows: std::vec::IntoIter<Vec<String>>,
    hints: Vec<Column>,
    index: usize,
    total: usize,
}

impl Iterator for Rows {
    type Item = Result<TypedRow, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.rows.next()?;
        let index = self.index;
        self.index += 1;

        let text = Codec::String;
        let mut values = Vec::with_capacity(raw.len());
        for (i, field) in raw.iter().enumerate() {
            let (name, codec) = match self.hints.get(i) {
                Some(column) => (column.name.as_str(), &column.codec),
                None => ("", &text),
            };
            match codec.decode(field) {
                Ok(value) => values.push(value),
                Err(source) => {
                    return Some(Err(StoreError::Decode {
                        row: index,
                        column: if name.is_empty() {
                            format!("#{}", i)
                        } else {
                            name.to_string()
                        },
                        source,
                    }))
                }
            }
        }
        Some(Ok(TypedRow {
            values,
            index,
            total: self.total,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// Run `query` and decode each field with the matching column hint.
pub fn read_typed<S: AnalyticalStore + ?Sized>(
    store: &mut S,
    query: &Query,
    hints: &[Column],
) -> Result<Rows, StoreError> {
    let rows = store.read(query)?;
    let total = rows.len();
    Ok(Rows {
        rows: rows.into_iter(),
        hints: hints.to_vec(),
        index: 0,
        total,
    })
}

/// Import cursor of `table`: `None` when the table is empty.
pub fn read_cursor<S: AnalyticalStore + ?Sized>(
    store: &mut S,
    table: &str,
) -> Result<Option<u64>, StoreError> {
    let query = Query::Cursor {
        table: table.to_string(),
    };
    let hints = [
        Column::new("count", Codec::UInt64),
        Column::new("max_id", Codec::UInt64),
    ];
    let row = match read_typed(store, &query, &hints)?.next() {
        Some(row) => row?,
        None => return Ok(None),
    };
    match row.values.as_slice() {
        [Value::UInt(0), ..] => Ok(None),
        [_, Value::UInt(max)] => Ok(Some(*max)),
        _ => Err(StoreError::Statement {
            statement: format!("{:?}", query),
            response: format!("unexpected cursor row {:?}", row.values),
        }),
    }
}
