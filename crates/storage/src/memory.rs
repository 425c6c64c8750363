//! In-process analytical store.
//!
//! Interprets [`Statement`]s structurally instead of parsing SQL, and keeps
//! the rendered SQL of every accepted statement so tests can assert on what a
//! real server would have received.

use std::collections::BTreeMap;

use majorka_core::{tsv, Column, DATE_COLUMN, ID_COLUMN};

use crate::error::StoreError;
use crate::statement::{Query, SqlGenerator, Statement, TableDef};
use crate::traits::AnalyticalStore;

/// A table held by [`MemoryStore`]. Rows are stored in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryTable {
    pub columns: Vec<(String, String)>,
    pub rows: Vec<Vec<String>>,
}

impl MemoryTable {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    /// Field of `row` under column `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<&str> {
        let column = self.position(name)?;
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}

#[derive(Debug)]
pub struct MemoryStore {
    sql: SqlGenerator,
    tables: BTreeMap<String, MemoryTable>,
    log: Vec<String>,
    offline: bool,
    reject: Option<String>,
    today: String,
}

impl MemoryStore {
    pub fn new(database: impl Into<String>) -> Self {
        MemoryStore {
            sql: SqlGenerator::new(database),
            tables: BTreeMap::new(),
            log: Vec::new(),
            offline: false,
            reject: None,
            today: "1970-01-01".to_string(),
        }
    }

    /// Seed a table with `columns` and no rows.
    pub fn with_table(mut self, name: &str, columns: &[Column]) -> Self {
        self.tables.insert(
            name.to_string(),
            MemoryTable {
                columns: columns
                    .iter()
                    .map(|c| (c.name.clone(), c.codec.wire_type_name()))
                    .collect(),
                rows: Vec::new(),
            },
        );
        self
    }

    /// Value the creation column defaults to when an insert omits it.
    pub fn set_today(&mut self, date: &str) {
        self.today = date.to_string();
    }

    /// Simulate the server going away: every call fails with `Connectivity`.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Reject every statement whose SQL contains `fragment`.
    pub fn reject_statements_containing(&mut self, fragment: &str) {
        self.reject = Some(fragment.to_string());
    }

    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.get(name)
    }

    /// SQL of every accepted statement, in order.
    pub fn statements(&self) -> &[String] {
        &self.log
    }

    pub fn count_statements(&self, prefix: &str) -> usize {
        self.log.iter().filter(|s| s.starts_with(prefix)).count()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Connectivity {
                url: "memory".to_string(),
                message: "store is offline".to_string(),
            });
        }
        Ok(())
    }

    fn table_mut(&mut self, name: &str, sql: &str) -> Result<&mut MemoryTable, StoreError> {
        let database = self.sql.database().to_string();
        self.tables.get_mut(name).ok_or_else(|| StoreError::Statement {
            statement: sql.to_string(),
            response: format!("Code: 60. DB::Exception: Table {}.{} doesn't exist.", database, name),
        })
    }

    fn apply(&mut self, statement: &Statement, sql: &str) -> Result<(), StoreError> {
        match statement {
            Statement::CreateDatabase => Ok(()),
            Statement::DropDatabase => {
                self.tables.clear();
                Ok(())
            }
            Statement::CreateTable(TableDef { name, columns }) => {
                self.tables.entry(name.clone()).or_insert_with(|| MemoryTable {
                    columns: columns
                        .iter()
                        .map(|c| (c.name.clone(), c.codec.wire_type_name()))
                        .collect(),
                    rows: Vec::new(),
                });
                Ok(())
            }
            Statement::AddColumn {
                table,
                column,
                after,
            } => {
                let t = self.table_mut(table, sql)?;
                if t.position(&column.name).is_some() {
                    return Err(rejected(sql, format!("column {} already exists", column.name)));
                }
                let anchor = t
                    .position(after)
                    .ok_or_else(|| rejected(sql, format!("no column {} to add after", after)))?;
                t.columns
                    .insert(anchor + 1, (column.name.clone(), column.codec.wire_type_name()));
                for row in &mut t.rows {
                    row.insert(anchor + 1, String::new());
                }
                Ok(())
            }
            Statement::Insert {
                table,
                columns,
                payload,
            } => {
                let today = self.today.clone();
                let t = self.table_mut(table, sql)?;
                let mut targets = Vec::with_capacity(columns.len());
                for name in columns {
                    let position = t
                        .position(name)
                        .ok_or_else(|| rejected(sql, format!("no column {} in table", name)))?;
                    targets.push(position);
                }
                let mut loaded = Vec::new();
                for (i, fields) in tsv::parse(payload).into_iter().enumerate() {
                    if fields.len() != targets.len() {
                        return Err(rejected(
                            sql,
                            format!("row {} has {} fields, expected {}", i, fields.len(), targets.len()),
                        ));
                    }
                    let mut row: Vec<String> = t
                        .columns
                        .iter()
                        .map(|(name, _)| if name == DATE_COLUMN { today.clone() } else { String::new() })
                        .collect();
                    for (field, &target) in fields.into_iter().zip(&targets) {
                        row[target] = field;
                    }
                    loaded.push(row);
                }
                t.rows.extend(loaded);
                Ok(())
            }
        }
    }

    fn cursor(&self, table: &str, sql: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let t = self.tables.get(table).ok_or_else(|| StoreError::Statement {
            statement: sql.to_string(),
            response: format!("Code: 60. DB::Exception: Table {} doesn't exist.", table),
        })?;
        let id_column = t
            .position(ID_COLUMN)
            .ok_or_else(|| rejected(sql, format!("no {} column", ID_COLUMN)))?;
        let mut max = 0u64;
        for row in &t.rows {
            let id = row[id_column]
                .parse::<u64>()
                .map_err(|e| rejected(sql, format!("bad id {:?}: {}", row[id_column], e)))?;
            max = max.max(id);
        }
        Ok(vec![vec![t.rows.len().to_string(), max.to_string()]])
    }
}

fn rejected(sql: &str, response: String) -> StoreError {
    StoreError::Statement {
        statement: sql.to_string(),
        response,
    }
}

impl AnalyticalStore for MemoryStore {
    fn ping(&mut self) -> Result<(), StoreError> {
        self.check_online()
    }

    fn describe(&mut self, table: &str) -> Result<Vec<(String, String)>, StoreError> {
        self.check_online()?;
        let sql = self.sql.describe(table);
        Ok(self.table_mut(table, &sql)?.columns.clone())
    }

    fn write(&mut self, statement: &Statement) -> Result<(), StoreError> {
        self.check_online()?;
        let sql = self.sql.statement(statement);
        if let Some(fragment) = &self.reject {
            if sql.contains(fragment.as_str()) {
                return Err(rejected(&sql, "rejected by test".to_string()));
            }
        }
        self.apply(statement, &sql)?;
        self.log.push(sql);
        Ok(())
    }

    fn read(&mut self, query: &Query) -> Result<Vec<Vec<String>>, StoreError> {
        self.check_online()?;
        let sql = self.sql.query(query);
        match query {
            Query::Cursor { table } => self.cursor(table, &sql),
            Query::Sql(_) => Err(rejected(&sql, "memory store cannot evaluate SQL".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::read_cursor;
    use majorka_core::{Codec, Schema};

    fn schema() -> Schema {
        Schema::new(vec![Column::new("name", Codec::String)]).unwrap()
    }

    #[test]
    fn insert_fills_omitted_creation_column() {
        let mut store = MemoryStore::new("db").with_table("t", schema().columns());
        store.set_today("2019-02-18");
        store
            .write(&Statement::Insert {
                table: "t".to_string(),
                columns: vec!["id".to_string(), "name".to_string()],
                payload: "0\talpha".to_string(),
            })
            .unwrap();
        let table = store.table("t").unwrap();
        assert_eq!(table.rows, vec![vec!["0", "2019-02-18", "alpha"]]);
        assert_eq!(table.value(0, "name"), Some("alpha"));
    }

    #[test]
    fn add_column_backfills_empty_strings() {
        let mut store = MemoryStore::new("db").with_table("t", schema().columns());
        store
            .write(&Statement::Insert {
                table: "t".to_string(),
                columns: vec!["id".to_string(), "date_added".to_string(), "name".to_string()],
                payload: "3\t2019-01-01\tx".to_string(),
            })
            .unwrap();
        store
            .write(&Statement::AddColumn {
                table: "t".to_string(),
                column: Column::dimension("zone"),
                after: "date_added".to_string(),
            })
            .unwrap();
        let table = store.table("t").unwrap();
        assert_eq!(table.column_names(), vec!["id", "date_added", "dim_zone", "name"]);
        assert_eq!(table.rows[0], vec!["3", "2019-01-01", "", "x"]);
        assert_eq!(read_cursor(&mut store, "t").unwrap(), Some(3));
    }

    #[test]
    fn offline_store_fails_every_call() {
        let mut store = MemoryStore::new("db");
        store.set_offline(true);
        assert!(matches!(store.ping(), Err(StoreError::Connectivity { .. })));
        assert!(matches!(
            read_cursor(&mut store, "t"),
            Err(StoreError::Connectivity { .. })
        ));
    }

    #[test]
    fn rejected_statements_are_not_logged() {
        let mut store = MemoryStore::new("db").with_table("t", schema().columns());
        store.reject_statements_containing("ALTER TABLE");
        let err = store
            .write(&Statement::AddColumn {
                table: "t".to_string(),
                column: Column::dimension("os"),
                after: "name".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Statement { .. }));
        assert!(store.statements().is_empty());
        assert_eq!(store.table("t").unwrap().columns.len(), 3);
    }
}
