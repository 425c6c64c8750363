//! Key-value backends the bus reads from.

use std::collections::BTreeMap;

use majorka_core::EntityId;

use crate::error::BusError;

/// Raw key-value access. Values are UTF-8 strings (JSON bodies or counters).
pub trait BusBackend {
    fn get(&mut self, key: &str) -> Result<Option<String>, BusError>;

    /// Fetch many keys in one round trip, preserving order.
    fn get_many(&mut self, keys: &[String]) -> Result<Vec<Option<String>>, BusError>;
}

/// Redis (or any RESP-compatible server such as Dragonfly).
pub struct RedisBackend {
    connection: redis::Connection,
}

impl RedisBackend {
    pub fn connect(url: &str) -> Result<Self, BusError> {
        let client = redis::Client::open(url).map_err(backend_error)?;
        let connection = client.get_connection().map_err(backend_error)?;
        Ok(RedisBackend { connection })
    }
}

fn backend_error(e: redis::RedisError) -> BusError {
    BusError::Backend {
        message: e.to_string(),
    }
}

impl BusBackend for RedisBackend {
    fn get(&mut self, key: &str) -> Result<Option<String>, BusError> {
        tracing::debug!(key, "bus GET");
        redis::cmd("GET")
            .arg(key)
            .query::<Option<String>>(&mut self.connection)
            .map_err(backend_error)
    }

    fn get_many(&mut self, keys: &[String]) -> Result<Vec<Option<String>>, BusError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(keys = keys.len(), "bus pipelined GET");
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.cmd("GET").arg(key);
        }
        pipe.query::<Vec<Option<String>>>(&mut self.connection)
            .map_err(backend_error)
    }
}

/// In-process backend with a producer-side `push` for tests and fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
    offline: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Append a record of `kind` the way the producer does: store it under
    /// the next index and bump the counter.
    pub fn push(&mut self, kind: &str, body: impl Into<String>) -> EntityId {
        let counter = EntityId::counter_key(kind);
        let count = self
            .entries
            .get(&counter)
            .and_then(|c| c.parse::<u64>().ok())
            .unwrap_or(0);
        let id = EntityId::new(kind, count);
        self.entries.insert(id.to_string(), body.into());
        self.entries.insert(counter, (count + 1).to_string());
        id
    }

    /// Simulate an unreachable server.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    fn check_online(&self) -> Result<(), BusError> {
        if self.offline {
            return Err(BusError::Backend {
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

impl BusBackend for MemoryBackend {
    fn get(&mut self, key: &str) -> Result<Option<String>, BusError> {
        self.check_online()?;
        Ok(self.entries.get(key).cloned())
    }

    fn get_many(&mut self, keys: &[String]) -> Result<Vec<Option<String>>, BusError> {
        self.check_online()?;
        Ok(keys.iter().map(|k| self.entries.get(k).cloned()).collect())
    }
}
