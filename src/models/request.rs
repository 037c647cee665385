//! Request model written to the external tool's stdin.

use serde::{Deserialize, Serialize};

/// Author of a single chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instructions framing the whole exchange.
    System,
    /// Text authored by the editor user.
    User,
    /// Earlier model output replayed as context.
    Assistant,
}

/// One chat message in a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Message author.
    pub role: Role,
    /// Message body.
    pub content: String,
}

impl Message {
    /// Build a `system` message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Build a `user` message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an `assistant` message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Complete request payload, serialized once per session.
///
/// Wire shape: `{"messages": [{"role": …, "content": …}, …], "stream": bool}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Request {
    /// Ordered conversation sent to the tool.
    pub messages: Vec<Message>,
    /// Whether the caller displays content deltas as they arrive.
    pub stream: bool,
}

impl Request {
    /// Construct a request from its messages and streaming flag.
    #[must_use]
    pub fn new(messages: Vec<Message>, stream: bool) -> Self {
        Self { messages, stream }
    }

    /// Serialize the request as a single newline-free JSON document.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Protocol` if serialization fails.
    pub fn to_json_bytes(&self) -> crate::Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|err| crate::AppError::Protocol(format!("failed to serialise request: {err}")))
    }
}
