//! majorka-bus: read side of the operational event bus.
//!
//! - [`EventBus::multiread`] -- lazy, restartable range reads per entity kind
//! - [`EventBus::by_id`] -- pipelined batch lookups of linked records
//! - [`RedisBackend`] / [`MemoryBackend`] -- key-value backends

mod backend;
mod bus;
mod error;

pub use backend::{BusBackend, MemoryBackend, RedisBackend};
pub use bus::{EventBus, MultiRead, RawRecord};
pub use error::BusError;
