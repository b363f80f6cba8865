/// Failures talking to an embedding or chat endpoint.
///
/// Every variant is recoverable from the caller's point of view: the
/// indexer drops the affected chunk, the retriever turns it into a typed
/// per-query failure.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Service unreachable, transport error or client-side timeout.
    #[error("connection to {endpoint} failed: {source}")]
    ConnectionFailure {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response.
    #[error("{endpoint} returned {status}: {body}")]
    ServiceError {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// 2xx response whose body lacks the expected field.
    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("rate limited by {endpoint}")]
    RateLimited { endpoint: String },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Whether the remote side was never reached.
    #[must_use]
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
