//! Entity identity and the record abstraction rows are built from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::value::Value;

/// Suffix of the per-kind key holding the highest assigned index.
pub const COUNTER_SUFFIX: &str = "_counter";

/// Errors parsing a textual entity id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("entity id '{0}' is not of the form Kind:[index]")]
    Malformed(String),
    #[error("entity id '{id}' has a non-numeric index")]
    BadIndex { id: String },
}

/// Bus identity of a stored entity, written `Kind:[index]`.
///
/// Indices start at 0 per kind and are assigned densely in write order.
/// The store's `id` column holds the index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    pub kind: String,
    pub index: u64,
}

impl EntityId {
    pub fn new(kind: impl Into<String>, index: u64) -> Self {
        EntityId {
            kind: kind.into(),
            index,
        }
    }

    /// Key of the counter for entities of `kind`, e.g. `Hits:_counter`.
    pub fn counter_key(kind: &str) -> String {
        format!("{}:{}", kind, COUNTER_SUFFIX)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[{}]", self.kind, self.index)
    }
}

impl FromStr for EntityId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| IdentityError::Malformed(s.to_string()))?;
        if kind.is_empty() {
            return Err(IdentityError::Malformed(s.to_string()));
        }
        let digits = rest
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .ok_or_else(|| IdentityError::Malformed(s.to_string()))?;
        let index = digits
            .parse::<u64>()
            .map_err(|_| IdentityError::BadIndex { id: s.to_string() })?;
        Ok(EntityId::new(kind, index))
    }
}

impl TryFrom<String> for EntityId {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

/// Anything a row can be built from.
///
/// `field` exposes named values for statically declared columns. Records
/// that carry an open attribute map (hits) return it from `dimensions`.
pub trait Record {
    fn id(&self) -> &EntityId;

    fn field(&self, name: &str) -> Option<Value>;

    fn dimensions(&self) -> Option<&BTreeMap<String, String>> {
        None
    }
}
