//! History entries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role of scripted content injected by the service.
pub const ROLE_SYSTEM: &str = "system";
/// Role of messages sent by the player.
pub const ROLE_USER: &str = "user";

/// One entry of a session's history.
///
/// An entry is any JSON object. Entries built by the service carry a string
/// `role` and a `content` value; imported entries are kept exactly as sent,
/// including explicit nulls and non-string roles, so an export returns what
/// was imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntry(Map<String, Value>);

impl HistoryEntry {
    /// Build an entry with the given role and content.
    pub fn new(role: impl Into<String>, content: Value) -> Self {
        let mut fields = Map::new();
        fields.insert("role".to_string(), Value::String(role.into()));
        fields.insert("content".to_string(), content);
        Self(fields)
    }

    /// Scripted content, such as a scenario document.
    pub fn system(content: Value) -> Self {
        Self::new(ROLE_SYSTEM, content)
    }

    /// A player message, stored verbatim.
    pub fn user(message: impl Into<String>) -> Self {
        Self::new(ROLE_USER, Value::String(message.into()))
    }

    /// The role, when it is a string.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    /// The content field, which may be an explicit `null`.
    #[must_use]
    pub fn content(&self) -> Option<&Value> {
        self.0.get("content")
    }

    /// All fields of the entry.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for HistoryEntry {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
