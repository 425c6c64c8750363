//! ClickHouse-over-HTTP client.
//!
//! Every request sends the first line of the SQL as the `query` parameter.
//! Multi-line statements (CREATE TABLE, bulk inserts) are POSTed with the
//! remaining lines as the body; single-line reads use GET.

use std::time::Duration;

use majorka_core::tsv;

use crate::error::StoreError;
use crate::statement::{split_statement, Query, SqlGenerator, Statement};
use crate::traits::AnalyticalStore;

pub const DEFAULT_URL: &str = "http://localhost:8123";
pub const DEFAULT_DATABASE: &str = "majorka";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection settings for [`HttpStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub url: String,
    pub database: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            url: DEFAULT_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
}

pub struct HttpStore {
    agent: ureq::Agent,
    url: String,
    sql: SqlGenerator,
}

impl HttpStore {
    /// Build a client and ping the server.
    pub fn connect(settings: &StoreSettings) -> Result<Self, StoreError> {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(settings.connect_timeout))
            .timeout_recv_body(Some(settings.read_timeout))
            .timeout_recv_response(Some(settings.read_timeout))
            .http_status_as_error(false)
            .build();
        let mut store = HttpStore {
            agent: ureq::Agent::new_with_config(config),
            url: settings.url.trim_end_matches('/').to_string(),
            sql: SqlGenerator::new(settings.database.as_str()),
        };
        store.ping()?;
        Ok(store)
    }

    /// Connect and create the database if it does not exist yet.
    pub fn connected(settings: &StoreSettings) -> Result<Self, StoreError> {
        let mut store = HttpStore::connect(settings)?;
        store.write(&Statement::CreateDatabase)?;
        Ok(store)
    }

    pub fn database(&self) -> &str {
        self.sql.database()
    }

    /// Drop the whole database.
    pub fn drop_database(&mut self) -> Result<(), StoreError> {
        self.write(&Statement::DropDatabase)
    }

    /// Column layout a query would produce.
    pub fn describe_query(&mut self, sql: &str) -> Result<Vec<(String, String)>, StoreError> {
        let text = self.sql.describe_query(sql);
        let body = self.execute(&text, Method::Get)?;
        Ok(name_type_pairs(&body))
    }

    /// Send `sql` to the server. The first line travels as the `query`
    /// parameter and the rest as the request body.
    ///
    /// ClickHouse runs GET requests read-only, so every write goes out as
    /// POST even when it has no body. Reads use GET unless they carry one.
    fn execute(&self, sql: &str, method: Method) -> Result<String, StoreError> {
        let (head, body) = split_statement(sql);
        let method = match (method, body) {
            (Method::Get, Some(_)) => Method::Post,
            (method, _) => method,
        };
        tracing::debug!(sql = %head, ?method, body_bytes = body.map_or(0, str::len), "store request");

        let result = match method {
            Method::Post => self
                .agent
                .post(&self.url)
                .query("query", head)
                .send(body.unwrap_or("")),
            Method::Get => self.agent.get(&self.url).query("query", head).call(),
        };
        let response = result.map_err(|e| StoreError::Connectivity {
            url: self.url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let text = response
            .into_body()
            .read_to_string()
            .map_err(|e| StoreError::Connectivity {
                url: self.url.clone(),
                message: format!("could not read response body: {}", e),
            })?;
        if status != 200 {
            return Err(StoreError::Statement {
                statement: sql.to_string(),
                response: text,
            });
        }
        Ok(text)
    }
}

impl AnalyticalStore for HttpStore {
    fn ping(&mut self) -> Result<(), StoreError> {
        let hello = self.sql.hello();
        match self.execute(hello, Method::Get) {
            Ok(_) => Ok(()),
            Err(StoreError::Statement { response, .. }) => Err(StoreError::Connectivity {
                url: self.url.clone(),
                message: response,
            }),
            Err(e) => Err(e),
        }
    }

    fn describe(&mut self, table: &str) -> Result<Vec<(String, String)>, StoreError> {
        let text = self.sql.describe(table);
        let body = self.execute(&text, Method::Get)?;
        Ok(name_type_pairs(&body))
    }

    fn write(&mut self, statement: &Statement) -> Result<(), StoreError> {
        let text = self.sql.statement(statement);
        self.execute(&text, Method::Post).map(|_| ())
    }

    fn read(&mut self, query: &Query) -> Result<Vec<Vec<String>>, StoreError> {
        let text = self.sql.query(query);
        let body = self.execute(&text, Method::Get)?;
        Ok(tsv::parse(&body))
    }
}

/// First two fields of each `DESCRIBE` row.
fn name_type_pairs(body: &str) -> Vec<(String, String)> {
    tsv::parse(body)
        .into_iter()
        .filter_map(|row| {
            let mut fields = row.into_iter();
            Some((fields.next()?, fields.next()?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{Query, TableDef};
    use majorka_core::{Codec, Column};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve `count` requests, answering each with `1`, and return
    /// "METHOD FIRSTWORD" for each, where FIRSTWORD starts the `query` param.
    fn recording_server(count: usize) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for stream in listener.incoming().take(count) {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut length = 0usize;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    let header = header.trim_end();
                    if header.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = header.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            length = value.trim().parse().unwrap();
                        }
                    }
                }
                let mut body = vec![0u8; length];
                reader.read_exact(&mut body).unwrap();

                let method = request_line.split(' ').next().unwrap_or("").to_string();
                let query = request_line
                    .split("query=")
                    .nth(1)
                    .unwrap_or("")
                    .chars()
                    .take_while(|c| c.is_ascii_alphabetic())
                    .collect::<String>();
                seen.push(format!("{} {}", method, query));

                stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n1\n")
                    .unwrap();
            }
            seen
        });
        (url, handle)
    }

    #[test]
    fn describe_rows_keep_name_and_type() {
        let body = "id\tUInt64\t\t\t\t\t\ndate_added\tDate\tDEFAULT\ttoday()\t\t\t\n";
        assert_eq!(
            name_type_pairs(body),
            vec![
                ("id".to_string(), "UInt64".to_string()),
                ("date_added".to_string(), "Date".to_string()),
            ]
        );
    }

    #[test]
    fn unreachable_server_is_a_connectivity_error() {
        let settings = StoreSettings {
            url: "http://127.0.0.1:1".to_string(),
            connect_timeout: Duration::from_millis(200),
            read_timeout: Duration::from_millis(200),
            ..StoreSettings::default()
        };
        assert!(matches!(
            HttpStore::connect(&settings),
            Err(StoreError::Connectivity { .. })
        ));
    }

    #[test]
    fn writes_are_posted_and_reads_use_get() {
        let (url, server) = recording_server(6);
        let settings = StoreSettings {
            url,
            database: "majorka".to_string(),
            ..StoreSettings::default()
        };
        let mut store = HttpStore::connect(&settings).unwrap();
        store.write(&Statement::CreateDatabase).unwrap();
        store
            .write(&Statement::AddColumn {
                table: "hits".to_string(),
                column: Column::dimension("zone"),
                after: "date_added".to_string(),
            })
            .unwrap();
        store
            .write(&Statement::CreateTable(TableDef {
                name: "offers".to_string(),
                columns: vec![
                    Column::new("id", Codec::UInt64),
                    Column::new("date_added", Codec::Date),
                ],
            }))
            .unwrap();
        store.describe("offers").unwrap();
        store
            .read(&Query::Cursor {
                table: "offers".to_string(),
            })
            .unwrap();

        assert_eq!(
            server.join().unwrap(),
            vec![
                "GET SELECT",
                "POST CREATE",
                "POST ALTER",
                "POST CREATE",
                "GET DESCRIBE",
                "GET SELECT",
            ]
        );
    }
}
