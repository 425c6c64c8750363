use majorka_core::CodecError;

/// All errors that can be returned by an `AnalyticalStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached (ping failed, connection refused,
    /// transport timeout). Fatal, never retried here.
    #[error("analytical store at {url} is unreachable: {message}")]
    Connectivity { url: String, message: String },

    /// The store answered a statement with a non-success status.
    /// Carries the statement as sent and the raw response body.
    #[error("statement rejected by analytical store: {response}\n{statement}")]
    Statement { statement: String, response: String },

    /// A returned field could not be decoded with its column hint.
    #[error("cannot decode row {row} column '{column}': {source}")]
    Decode {
        row: usize,
        column: String,
        #[source]
        source: CodecError,
    },
}
