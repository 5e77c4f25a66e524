//! HTTP client for the erk session API.

use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client as HttpClient, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CreateSessionRequest, EventKind, ListSessionsResponse, SendMessageRequest, Session,
    StreamEvent,
};
use crate::sse::SseDecoder;

/// Connection settings for [`SessionClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, e.g. `http://localhost:8937`. A trailing slash is fine.
    pub base_url: String,
    /// Bearer token attached to every request when present.
    pub token: Option<String>,
}

/// Client for session CRUD and message streaming.
///
/// Cheap to clone; clones share the underlying connection pool. The client
/// holds no session state of its own — every read goes to the server.
#[derive(Clone)]
pub struct SessionClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
}

/// Handle to an in-flight [`SessionClient::send_message`] stream.
///
/// Dropping the handle detaches: the stream runs to completion in the
/// background. Only [`MessageHandle::cancel`] stops it early, and a cancelled
/// stream ends silently with no synthetic event.
pub struct MessageHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MessageHandle {
    /// Request cooperative cancellation of the stream.
    ///
    /// Observed at the next suspension point; an event handler already
    /// running is not interrupted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Clone of the token the streaming task observes, for wiring
    /// cancellation to an external signal.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the streaming task has finished, for any reason.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the streaming task to finish.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

impl SessionClient {
    pub fn new(config: ClientConfig) -> Self {
        // Connection establishment is bounded, but there is no overall
        // request timeout: it would sever long-running streams.
        let http = HttpClient::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| HttpClient::new());

        Self {
            http,
            base_url: normalize_base_url(&config.base_url),
            token: config.token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a session bound to a working directory.
    pub async fn create_session(&self, request: &CreateSessionRequest) -> Result<Session> {
        debug!(working_directory = %request.working_directory, "creating session");
        let response = self
            .request(Method::POST, &self.url("/sessions"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::from_response(response).await);
        }
        decode_json(response).await
    }

    /// List all sessions known to the server.
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        let response = self
            .request(Method::GET, &self.url("/sessions"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::from_response(response).await);
        }
        let envelope: ListSessionsResponse = decode_json(response).await?;
        Ok(envelope.sessions)
    }

    /// Fetch one session by identifier.
    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        let response = self
            .request(Method::GET, &self.url(&format!("/sessions/{session_id}")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::from_response(response).await);
        }
        decode_json(response).await
    }

    /// Delete a session by identifier.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        debug!(session_id, "deleting session");
        let response = self
            .request(
                Method::DELETE,
                &self.url(&format!("/sessions/{session_id}")),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::from_response(response).await);
        }
        Ok(())
    }

    /// Send a message and stream the resulting events to `on_event`.
    ///
    /// Returns immediately; the request and stream consumption run in a
    /// spawned task. Events reach the handler in wire order. A transport
    /// failure is delivered as one synthetic `error` event and ends the
    /// stream; cancellation via the returned handle ends it silently.
    ///
    /// Errors never come back through this call, only through the handler.
    pub fn send_message<F>(
        &self,
        session_id: &str,
        request: SendMessageRequest,
        on_event: F,
    ) -> MessageHandle
    where
        F: FnMut(StreamEvent) + Send + 'static,
    {
        let builder = self
            .request(
                Method::POST,
                &self.url(&format!("/sessions/{session_id}/messages")),
            )
            .json(&request);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_stream(builder, cancel.clone(), on_event));

        MessageHandle { cancel, task }
    }

    /// Send a message and block until the stream ends, returning the
    /// concatenated `text` content.
    ///
    /// An `error` event or a transport failure surfaces as
    /// [`Error::Stream`]. A stream that ends without `done` yields whatever
    /// text arrived.
    pub async fn send_and_collect(
        &self,
        session_id: &str,
        request: SendMessageRequest,
    ) -> Result<String> {
        let response = self
            .request(
                Method::POST,
                &self.url(&format!("/sessions/{session_id}/messages")),
            )
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "message endpoint returned non-success status");
        }

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut text = String::new();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|err| Error::Stream(err.to_string()))?;
            for event in decoder.feed(&bytes) {
                match event.kind {
                    EventKind::Text => {
                        if let Some(content) = event.text() {
                            text.push_str(content);
                        }
                    }
                    EventKind::Error => {
                        let message = event.error_message().unwrap_or("stream error");
                        return Err(Error::Stream(message.to_string()));
                    }
                    EventKind::Done => return Ok(text),
                    _ => {}
                }
            }
        }
        Ok(text)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// The read loop behind [`SessionClient::send_message`].
async fn run_stream<F>(builder: RequestBuilder, cancel: CancellationToken, mut on_event: F)
where
    F: FnMut(StreamEvent) + Send + 'static,
{
    let response = tokio::select! {
        _ = cancel.cancelled() => return,
        result = builder.send() => match result {
            Ok(response) => response,
            Err(err) => {
                on_event(synthetic_error(&err.to_string()));
                return;
            }
        },
    };

    // The body is consumed regardless of status; an error body that is not
    // in the event-stream format frames to zero records.
    if !response.status().is_success() {
        warn!(status = %response.status(), "message endpoint returned non-success status");
    }

    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => return,
            chunk = stream.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                for event in decoder.feed(&bytes) {
                    on_event(event);
                }
            }
            Some(Err(err)) => {
                warn!(error = %err, "stream read failed");
                on_event(synthetic_error(&err.to_string()));
                return;
            }
            None => return,
        }
    }
}

fn synthetic_error(message: &str) -> StreamEvent {
    let message = if message.is_empty() {
        "stream error"
    } else {
        message
    };
    StreamEvent {
        kind: EventKind::Error,
        data: json!({ "message": message }),
    }
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

fn normalize_base_url(value: &str) -> String {
    value.trim_end_matches('/').to_string()
}
