use reqwest::StatusCode;

/// Errors returned by the session client's request/response operations.
///
/// Streaming failures never appear here: `send_message` reports them through
/// the event callback as a synthetic `error` event, and cancellation ends the
/// stream silently. Only [`Error::Stream`] crosses back into this type, and
/// only from the collect convenience.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered a CRUD call with a non-success status.
    ///
    /// Raised before any body decoding is attempted; `body` is the raw
    /// response text, kept for diagnostics but never parsed as JSON.
    #[error("request failed with status {status}: {body}")]
    Request { status: StatusCode, body: String },

    /// A success response body was not the JSON shape we expected.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Transport-level failure (connection refused, DNS, TLS, ...).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The event stream failed or terminated with an `error` event.
    ///
    /// Produced only by [`send_and_collect`](crate::SessionClient::send_and_collect);
    /// raw streaming delivers the error event to the handler instead.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Non-success status from a response, capturing the raw body text.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::Request { status, body }
    }

    /// The HTTP status, if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Request { status, .. } => Some(*status),
            Error::Http(err) => err.status(),
            _ => None,
        }
    }
}
