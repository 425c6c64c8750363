use majorka_core::IdentityError;

/// Errors raised while reading the event bus.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The kind is not one the bus was configured with.
    #[error("unknown entity kind '{kind}'; known kinds: {}", .known.join(", "))]
    UnknownEntity { kind: String, known: Vec<String> },

    /// A key or linked id is not of the form `Kind:[index]`.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The backend (Redis) failed or is unreachable.
    #[error("event bus backend error: {message}")]
    Backend { message: String },

    /// A stored value could not be decoded.
    #[error("cannot decode {key}: {message}")]
    Decode { key: String, message: String },

    /// A key inside the counter's range holds no record.
    #[error("record {id} is missing although the counter covers it")]
    MissingRecord { id: String },
}
