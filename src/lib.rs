//! # erk-client
//!
//! Client for the erk session API: session CRUD over JSON HTTP plus a
//! streaming send-message operation that frames a chunked response body into
//! typed events.
//!
//! ## Quick start
//!
//! ```ignore
//! use erk_client::{ClientConfig, CreateSessionRequest, SendMessageRequest, SessionClient};
//!
//! #[tokio::main]
//! async fn main() -> erk_client::Result<()> {
//!     let client = SessionClient::new(ClientConfig {
//!         base_url: "http://localhost:8937".to_string(),
//!         token: None,
//!     });
//!
//!     let session = client
//!         .create_session(&CreateSessionRequest {
//!             working_directory: "/home/dev/project".to_string(),
//!             external_id: None,
//!         })
//!         .await?;
//!
//!     let handle = client.send_message(
//!         &session.session_id,
//!         SendMessageRequest::new("hello"),
//!         |event| println!("{}: {}", event.kind.as_str(), event.data),
//!     );
//!     handle.wait().await;
//!     Ok(())
//! }
//! ```
//!
//! Streaming errors never come back through the `send_message` call path:
//! transport failures arrive as a single synthetic `error` event and
//! cancellation ends the stream silently. Use
//! [`SessionClient::send_and_collect`] for a blocking call that folds the
//! stream into a `Result<String>`.

mod client;
mod error;
pub mod protocol;
pub mod sse;

pub use client::{ClientConfig, MessageHandle, SessionClient};
pub use error::{Error, Result};
pub use protocol::{
    CreateSessionRequest, EventKind, SendMessageRequest, Session, SessionStatus, StreamEvent,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    /// Public types cross async task boundaries and must be Send + Sync.
    #[test]
    fn public_types_are_send_sync() {
        assert_send_sync::<SessionClient>();
        assert_send_sync::<ClientConfig>();
        assert_send_sync::<MessageHandle>();
        assert_send_sync::<Session>();
        assert_send_sync::<StreamEvent>();
        assert_send_sync::<EventKind>();
        assert_send_sync::<Error>();
    }
}
