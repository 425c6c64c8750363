//! Entity-aware reads over a [`BusBackend`].
//!
//! Records of kind `K` live under `K:[0]`, `K:[1]`, ... and the key
//! `K:_counter` holds how many have been written. Only kinds the bus was
//! built with can be read.

use std::collections::BTreeSet;

use majorka_core::EntityId;
use serde::de::DeserializeOwned;

use crate::backend::BusBackend;
use crate::error::BusError;

/// A record body as stored on the bus, tagged with its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub id: EntityId,
    pub body: String,
}

impl RawRecord {
    /// Deserialize the JSON body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BusError> {
        serde_json::from_str(&self.body).map_err(|e| BusError::Decode {
            key: self.id.to_string(),
            message: e.to_string(),
        })
    }
}

pub struct EventBus<B> {
    backend: B,
    kinds: BTreeSet<String>,
}

impl<B: BusBackend> EventBus<B> {
    pub fn new<K: Into<String>>(backend: B, kinds: impl IntoIterator<Item = K>) -> Self {
        EventBus {
            backend,
            kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn check_kind(&self, kind: &str) -> Result<(), BusError> {
        if self.kinds.contains(kind) {
            return Ok(());
        }
        Err(BusError::UnknownEntity {
            kind: kind.to_string(),
            known: self.kinds.iter().cloned().collect(),
        })
    }

    /// Number of records written for `kind`. A missing counter means none.
    pub fn count(&mut self, kind: &str) -> Result<u64, BusError> {
        self.check_kind(kind)?;
        let key = EntityId::counter_key(kind);
        match self.backend.get(&key)? {
            None => Ok(0),
            Some(text) => text.trim().parse::<u64>().map_err(|e| BusError::Decode {
                key,
                message: e.to_string(),
            }),
        }
    }

    /// Lazily read records of `kind` with indices `start..=end`, ascending.
    ///
    /// `end` defaults to (and is clamped at) the last written index. A start
    /// past the last index yields an empty sequence.
    pub fn multiread(
        &mut self,
        kind: &str,
        start: u64,
        end: Option<u64>,
    ) -> Result<MultiRead<'_, B>, BusError> {
        let count = self.count(kind)?;
        let last = count.checked_sub(1);
        let end = match (last, end) {
            (Some(last), Some(end)) => Some(end.min(last)),
            (Some(last), None) => Some(last),
            (None, _) => None,
        };
        Ok(MultiRead {
            backend: &mut self.backend,
            kind: kind.to_string(),
            next: start,
            end,
        })
    }

    /// Fetch records by id in a single pipelined round trip. Absent keys
    /// yield `None` in their slot.
    pub fn by_id(&mut self, ids: &[EntityId]) -> Result<Vec<Option<RawRecord>>, BusError> {
        for id in ids {
            self.check_kind(&id.kind)?;
        }
        let keys: Vec<String> = ids.iter().map(EntityId::to_string).collect();
        let values = self.backend.get_many(&keys)?;
        Ok(ids
            .iter()
            .zip(values)
            .map(|(id, value)| {
                value.map(|body| RawRecord {
                    id: id.clone(),
                    body,
                })
            })
            .collect())
    }

    /// Parse a textual id and check its kind is known.
    pub fn checked_id(&self, text: &str) -> Result<EntityId, BusError> {
        let id: EntityId = text.parse()?;
        self.check_kind(&id.kind)?;
        Ok(id)
    }
}

/// Iterator returned by [`EventBus::multiread`].
///
/// [`position`](MultiRead::position) is the next index to read; passing it
/// as `start` to a new `multiread` resumes where this one stopped.
pub struct MultiRead<'a, B> {
    backend: &'a mut B,
    kind: String,
    next: u64,
    end: Option<u64>,
}

impl<B> MultiRead<'_, B> {
    pub fn position(&self) -> u64 {
        self.next
    }
}

impl<B: BusBackend> Iterator for MultiRead<'_, B> {
    type Item = Result<RawRecord, BusError>;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.end?;
        if self.next > end {
            return None;
        }
        let id = EntityId::new(self.kind.as_str(), self.next);
        let key = id.to_string();
        let result = match self.backend.get(&key) {
            Ok(Some(body)) => Ok(RawRecord { id, body }),
            Ok(None) => Err(BusError::MissingRecord { id: key }),
            Err(e) => Err(e),
        };
        // A failed read stops the sequence; position() still names the
        // index that failed so a restart retries it.
        if result.is_ok() {
            self.next += 1;
        } else {
            self.end = None;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Offer {
        name: String,
    }

    fn bus_with_offers(n: usize) -> EventBus<MemoryBackend> {
        let mut backend = MemoryBackend::new();
        for i in 0..n {
            backend.push("Offer", format!(r#"{{"name": "offer {}"}}"#, i));
        }
        EventBus::new(backend, ["Offer", "Hits"])
    }

    fn indices(read: MultiRead<'_, MemoryBackend>) -> Vec<u64> {
        read.map(|r| r.unwrap().id.index).collect()
    }

    #[test]
    fn reads_all_records_in_order() {
        let mut bus = bus_with_offers(3);
        assert_eq!(indices(bus.multiread("Offer", 0, None).unwrap()), vec![0, 1, 2]);
    }

    #[test]
    fn honours_start_and_end() {
        let mut bus = bus_with_offers(5);
        assert_eq!(indices(bus.multiread("Offer", 1, Some(3)).unwrap()), vec![1, 2, 3]);
        assert_eq!(indices(bus.multiread("Offer", 3, Some(99)).unwrap()), vec![3, 4]);
    }

    #[test]
    fn start_past_last_index_is_empty() {
        let mut bus = bus_with_offers(2);
        assert!(indices(bus.multiread("Offer", 2, None).unwrap()).is_empty());
        assert!(indices(bus.multiread("Hits", 0, None).unwrap()).is_empty());
    }

    #[test]
    fn reader_can_be_restarted_from_its_position() {
        let mut bus = bus_with_offers(4);
        let position = {
            let mut read = bus.multiread("Offer", 0, None).unwrap();
            read.next();
            read.next();
            read.position()
        };
        assert_eq!(position, 2);
        assert_eq!(indices(bus.multiread("Offer", position, None).unwrap()), vec![2, 3]);
    }

    #[test]
    fn unknown_kind_lists_known_kinds() {
        let mut bus = bus_with_offers(1);
        let err = bus.multiread("Campaign", 0, None).err().unwrap();
        assert_eq!(
            err.to_string(),
            "unknown entity kind 'Campaign'; known kinds: Hits, Offer"
        );
        assert!(matches!(
            bus.checked_id("Campaign:[0]"),
            Err(BusError::UnknownEntity { .. })
        ));
        assert!(matches!(bus.checked_id("Offer"), Err(BusError::Identity(_))));
    }

    #[test]
    fn gap_inside_counter_range_is_reported() {
        let mut backend = MemoryBackend::new();
        backend.set("Offer:_counter", "2");
        backend.set("Offer:[1]", "{}");
        let mut bus = EventBus::new(backend, ["Offer"]);
        let mut read = bus.multiread("Offer", 0, None).unwrap();
        assert!(matches!(read.next(), Some(Err(BusError::MissingRecord { .. }))));
        assert!(read.next().is_none());
        assert_eq!(read.position(), 0);
    }

    #[test]
    fn by_id_batches_and_marks_absent() {
        let mut bus = bus_with_offers(2);
        let found = bus
            .by_id(&[EntityId::new("Offer", 1), EntityId::new("Offer", 7)])
            .unwrap();
        assert_eq!(found.len(), 2);
        let offer: Offer = found[0].as_ref().unwrap().decode().unwrap();
        assert_eq!(offer.name, "offer 1");
        assert!(found[1].is_none());
    }

    #[test]
    fn bad_body_is_a_decode_error() {
        let mut backend = MemoryBackend::new();
        backend.push("Offer", "not json");
        let mut bus = EventBus::new(backend, ["Offer"]);
        let record = bus.multiread("Offer", 0, None).unwrap().next().unwrap().unwrap();
        assert!(matches!(
            record.decode::<Offer>(),
            Err(BusError::Decode { .. })
        ));
    }
}
