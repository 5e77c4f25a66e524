//! Wire types for the erk session API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversational working context bound to a filesystem working directory.
///
/// The server owns every field here; the client never mutates a session
/// locally and re-fetches whenever it needs current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub external_id: Option<String>,
    pub working_directory: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at")]
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub message_count: Option<u64>,
}

/// Server-owned lifecycle status. Statuses the client does not know about
/// parse as [`SessionStatus::Unknown`] rather than failing the whole decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Processing,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub working_directory: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    /// Server-enforced processing deadline. The client never times the
    /// stream out on its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl SendMessageRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            timeout_seconds: None,
        }
    }
}

/// Envelope for the list endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<Session>,
}

/// One decoded unit of incremental output from a running message exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub kind: EventKind,
    pub data: serde_json::Value,
}

impl StreamEvent {
    /// Text content, for `text` events carrying `{"content": ...}`.
    pub fn text(&self) -> Option<&str> {
        match self.kind {
            EventKind::Text => self.data.get("content").and_then(|v| v.as_str()),
            _ => None,
        }
    }

    /// Error message, for `error` events carrying `{"message": ...}`.
    pub fn error_message(&self) -> Option<&str> {
        match self.kind {
            EventKind::Error => self.data.get("message").and_then(|v| v.as_str()),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.kind == EventKind::Done
    }

    pub fn is_error(&self) -> bool {
        self.kind == EventKind::Error
    }
}

/// Event-type vocabulary of the stream.
///
/// Two API revisions are in the wild: one says `text`/`tool_use`, the other
/// `assistant_text`/`tool`. Both spellings map onto the same kinds here.
/// Anything else becomes [`EventKind::Unknown`] and is still delivered, so
/// callers skip what they do not understand instead of losing the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Text,
    ToolUse,
    ToolResult,
    Error,
    Done,
    Unknown(String),
}

impl EventKind {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "text" | "assistant_text" => EventKind::Text,
            "tool_use" | "tool" => EventKind::ToolUse,
            "tool_result" => EventKind::ToolResult,
            "error" => EventKind::Error,
            "done" => EventKind::Done,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Text => "text",
            EventKind::ToolUse => "tool_use",
            EventKind::ToolResult => "tool_result",
            EventKind::Error => "error",
            EventKind::Done => "done",
            EventKind::Unknown(tag) => tag,
        }
    }
}
