//! Statements and queries issued to the analytical store, and their SQL text.
//!
//! Statements are structured values; only [`SqlGenerator`] turns them into
//! literal SQL. In-process stores interpret the structure directly.

use majorka_core::{Column, DATE_COLUMN, ID_COLUMN};

/// Rows per primary-key mark in the table engine.
pub const INDEX_GRANULARITY: u32 = 8192;

/// Destination table definition for `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<Column>,
}

/// A mutating statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateDatabase,
    DropDatabase,
    CreateTable(TableDef),
    /// Add `column` immediately after the existing column `after`.
    AddColumn {
        table: String,
        column: Column,
        after: String,
    },
    /// Bulk load of a tab-separated `payload` into `columns`.
    Insert {
        table: String,
        columns: Vec<String>,
        payload: String,
    },
}

/// A reading query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `SELECT count(), max(id)` of a table; the import cursor.
    Cursor { table: String },
    /// Arbitrary SQL text.
    Sql(String),
}

/// Renders statements and queries as SQL against one database.
#[derive(Debug, Clone)]
pub struct SqlGenerator {
    database: String,
}

impl SqlGenerator {
    pub fn new(database: impl Into<String>) -> Self {
        SqlGenerator {
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Health check query.
    pub fn hello(&self) -> &'static str {
        "SELECT 1"
    }

    pub fn statement(&self, statement: &Statement) -> String {
        match statement {
            Statement::CreateDatabase => {
                format!("CREATE DATABASE IF NOT EXISTS {}", quote(&self.database))
            }
            Statement::DropDatabase => {
                format!("DROP DATABASE IF EXISTS {}", quote(&self.database))
            }
            Statement::CreateTable(def) => self.create_table(def),
            Statement::AddColumn {
                table,
                column,
                after,
            } => format!(
                "ALTER TABLE {} ADD COLUMN {} {} AFTER {}",
                self.table(table),
                quote(&column.name),
                column.codec.wire_type_name(),
                quote(after)
            ),
            Statement::Insert {
                table,
                columns,
                payload,
            } => {
                let names: Vec<String> = columns.iter().map(|c| quote(c)).collect();
                format!(
                    "INSERT INTO {} ({}) FORMAT TabSeparated\n{}",
                    self.table(table),
                    names.join(", "),
                    payload
                )
            }
        }
    }

    pub fn query(&self, query: &Query) -> String {
        match query {
            Query::Cursor { table } => format!(
                "SELECT count(), max({}) FROM {}",
                quote(ID_COLUMN),
                self.table(table)
            ),
            Query::Sql(sql) => sql.clone(),
        }
    }

    pub fn describe(&self, table: &str) -> String {
        format!("DESCRIBE TABLE {}", self.table(table))
    }

    pub fn describe_query(&self, sql: &str) -> String {
        format!("DESCRIBE ({})", sql)
    }

    fn table(&self, table: &str) -> String {
        format!("{}.{}", quote(&self.database), quote(table))
    }

    fn create_table(&self, def: &TableDef) -> String {
        let mut lines = Vec::with_capacity(def.columns.len());
        for column in &def.columns {
            let mut line = format!("    {} {}", quote(&column.name), column.codec.wire_type_name());
            if column.name == DATE_COLUMN {
                line.push_str(" DEFAULT today()");
            }
            lines.push(line);
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {}\n(\n{}\n)\nENGINE = MergeTree()\nPARTITION BY toYYYYMM({})\nORDER BY ({}, {})\nSETTINGS index_granularity = {}",
            self.table(&def.name),
            lines.join(",\n"),
            quote(DATE_COLUMN),
            quote(ID_COLUMN),
            quote(DATE_COLUMN),
            INDEX_GRANULARITY
        )
    }
}

/// Backtick-quote an identifier.
pub fn quote(identifier: &str) -> String {
    format!("`{}`", identifier.replace('\\', "\\\\").replace('`', "\\`"))
}

/// Split SQL into the first line and the remainder. Multi-line statements
/// send their first line as the query parameter and the rest as the body.
pub fn split_statement(sql: &str) -> (&str, Option<&str>) {
    match sql.find('\n') {
        Some(pos) => {
            let head = sql[..pos].strip_suffix('\r').unwrap_or(&sql[..pos]);
            (head, Some(&sql[pos + 1..]))
        }
        None => (sql, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use majorka_core::{Codec, Schema};

    fn sql() -> SqlGenerator {
        SqlGenerator::new("majorka")
    }

    #[test]
    fn create_table_uses_merge_tree_with_identity_prefix() {
        let schema = Schema::new(vec![Column::new("name", Codec::String)]).unwrap();
        let text = sql().statement(&Statement::CreateTable(TableDef {
            name: "campaigns".to_string(),
            columns: schema.columns().to_vec(),
        }));
        assert_eq!(
            text,
            "CREATE TABLE IF NOT EXISTS `majorka`.`campaigns`\n(\n    `id` UInt64,\n    `date_added` Date DEFAULT today(),\n    `name` String\n)\nENGINE = MergeTree()\nPARTITION BY toYYYYMM(`date_added`)\nORDER BY (`id`, `date_added`)\nSETTINGS index_granularity = 8192"
        );
    }

    #[test]
    fn add_column_names_predecessor() {
        let text = sql().statement(&Statement::AddColumn {
            table: "hits".to_string(),
            column: Column::dimension("zone"),
            after: "date_added".to_string(),
        });
        assert_eq!(
            text,
            "ALTER TABLE `majorka`.`hits` ADD COLUMN `dim_zone` String AFTER `date_added`"
        );
    }

    #[test]
    fn insert_carries_payload_after_first_line() {
        let text = sql().statement(&Statement::Insert {
            table: "offers".to_string(),
            columns: vec!["id".to_string(), "name".to_string()],
            payload: "0\ta\n1\tb".to_string(),
        });
        assert_eq!(
            text,
            "INSERT INTO `majorka`.`offers` (`id`, `name`) FORMAT TabSeparated\n0\ta\n1\tb"
        );
        let (head, body) = split_statement(&text);
        assert_eq!(head, "INSERT INTO `majorka`.`offers` (`id`, `name`) FORMAT TabSeparated");
        assert_eq!(body, Some("0\ta\n1\tb"));
    }

    #[test]
    fn split_handles_crlf_and_single_line() {
        assert_eq!(split_statement("SELECT 1"), ("SELECT 1", None));
        assert_eq!(split_statement("A\r\nB\r\nC"), ("A", Some("B\r\nC")));
    }

    #[test]
    fn cursor_and_describe_queries() {
        let g = sql();
        assert_eq!(
            g.query(&Query::Cursor {
                table: "hits".to_string()
            }),
            "SELECT count(), max(`id`) FROM `majorka`.`hits`"
        );
        assert_eq!(g.describe("hits"), "DESCRIBE TABLE `majorka`.`hits`");
        assert_eq!(g.describe_query("SELECT 1"), "DESCRIBE (SELECT 1)");
        assert_eq!(
            g.statement(&Statement::CreateDatabase),
            "CREATE DATABASE IF NOT EXISTS `majorka`"
        );
    }

    #[test]
    fn quoting_escapes_backticks() {
        assert_eq!(quote("we`ird"), "`we\\`ird`");
    }
}
