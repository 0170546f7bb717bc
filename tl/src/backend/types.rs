//! Session message types
//!
//! These model what the backend returns for a session: messages tagged by
//! role, each carrying typed parts. Only text parts are interpreted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ModelConfig;

/// Identifier of a backend session (one isolated execution context)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One content segment of a message
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// Plain text
    Text(String),
    /// Any other segment kind (tool calls, files, reasoning...)
    Other { kind: String, raw: serde_json::Value },
}

impl Part {
    /// Classify a raw JSON part; unknown kinds are kept, not rejected
    pub fn from_json(raw: serde_json::Value) -> Self {
        let kind = raw.get("type").and_then(|t| t.as_str()).unwrap_or("unknown").to_string();
        if kind == "text"
            && let Some(text) = raw.get("text").and_then(|t| t.as_str())
        {
            return Part::Text(text.to_string());
        }
        Part::Other { kind, raw }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            Part::Other { .. } => None,
        }
    }
}

/// A message in a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMessage {
    pub id: String,
    pub role: Role,
    /// Model that produced (assistant) or was requested for (user) this message
    pub model: Option<ModelConfig>,
    pub parts: Vec<Part>,
}

impl SessionMessage {
    /// Create an assistant message with a single text part
    pub fn assistant_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            model: None,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Create a user message with a single text part
    pub fn user_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
            model: None,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = Some(model);
        self
    }

    /// All text parts joined by newlines
    pub fn text(&self) -> String {
        debug!(%self.id, part_count = self.parts.len(), "SessionMessage::text: called");
        self.parts.iter().filter_map(Part::as_text).collect::<Vec<_>>().join("\n")
    }
}

/// Most recent assistant message in a list ordered oldest first
pub fn latest_assistant(messages: &[SessionMessage]) -> Option<&SessionMessage> {
    messages.iter().rev().find(|m| m.role == Role::Assistant)
}
