use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a stored chat session on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Returns the raw session identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Message typed by the signed-in user.
    User,
    /// Response produced by the selected model.
    Ai,
    /// Any sender string the client does not recognise.
    #[serde(other)]
    Other,
}

impl Sender {
    /// Returns `true` when content from this sender may be rendered as markup.
    pub fn is_trusted_markup(self) -> bool {
        matches!(self, Self::Ai)
    }
}

/// One message of a stored session as returned by `load_session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub text: String,
    pub sender: Sender,
}

/// One row of the `sessions` listing: `[sessionId, {last_time, preview}]`.
///
/// The metadata object is decoded leniently: a missing, null or oddly typed
/// field becomes `None` instead of failing the whole listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Value, Value)", into = "(Value, Value)")]
pub struct HistoryEntry {
    pub session_id: SessionId,
    /// Raw `last_time` value; either epoch milliseconds or a date string.
    pub last_time: Option<Value>,
    pub preview: Option<String>,
}

impl From<(Value, Value)> for HistoryEntry {
    fn from((id, meta): (Value, Value)) -> Self {
        let session_id = match id {
            Value::String(s) => SessionId(s),
            other => SessionId(other.to_string()),
        };
        let last_time = meta.get("last_time").filter(|v| !v.is_null()).cloned();
        let preview = meta
            .get("preview")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            session_id,
            last_time,
            preview,
        }
    }
}

impl From<HistoryEntry> for (Value, Value) {
    fn from(entry: HistoryEntry) -> Self {
        let mut meta = serde_json::Map::new();
        if let Some(t) = entry.last_time {
            meta.insert("last_time".to_string(), t);
        }
        if let Some(p) = entry.preview {
            meta.insert("preview".to_string(), Value::String(p));
        }
        (Value::String(entry.session_id.0), Value::Object(meta))
    }
}
