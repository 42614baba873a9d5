use std::time::Duration;

/// Boxed error produced by a [`crate::Transport`] implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    /// Request target could not be parsed. No network attempt was made.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Header name or value rejected before sending.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// Client configuration could not be assembled.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// JSON payload could not be serialized. No network attempt was made.
    #[error("json encode error: {0}")]
    Encode(#[source] serde_json::Error),
    /// Connection, DNS or other failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
    /// A single attempt exceeded the configured timeout.
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
    /// Every attempt ended with a status outside `200..300`.
    ///
    /// The status code itself is not carried; it is only logged.
    #[error("non-2xx response received")]
    NonSuccessStatus,
    /// A response handed to [`crate::read_json_body`] was not successful.
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),
    /// The response body stream failed while being read.
    #[error("body read error: {0}")]
    Body(#[source] reqwest::Error),
    /// The response body was not valid JSON for the requested type.
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

impl HttpClientError {
    /// Wraps any error as a transport failure.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    /// Returns `true` for failures that happened before anything was sent.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. }
                | Self::InvalidHeader(_)
                | Self::InvalidConfig(_)
                | Self::Encode(_)
        )
    }
}
