//! Request and response bodies of the chat server endpoints.
//!
//! Every reply carries a `success` flag and, on failure, an optional
//! `error` string. Missing flags decode as `false`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{HistoryEntry, StoredMessage};

/// Body of `register` and `login`. `password` is always the hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsBody {
    pub username: String,
    pub password: String,
}

/// Generic `{success, error}` reply (register, logout, new_chat, save_api_key).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Reply of `login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthReply {
    /// Username of the established session; requires both the success flag
    /// and a non-empty username.
    pub fn signed_in_as(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.username.as_deref().filter(|u| !u.is_empty())
    }
}

/// Reply of `check_auth`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    #[serde(rename = "isLoggedIn", default)]
    pub is_logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl AuthStatus {
    pub fn signed_in_as(&self) -> Option<&str> {
        if !self.is_logged_in {
            return None;
        }
        self.username.as_deref().filter(|u| !u.is_empty())
    }
}

/// Body of `send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendBody {
    pub message: String,
    pub username: String,
}

/// Reply of `send`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply of `sessions`: either the ordered listing or an error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryReply {
    Sessions(Vec<HistoryEntry>),
    Failed { error: String },
}

/// Reply of `load_session`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSessionReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `select_model`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectModelBody {
    pub username: String,
    pub model_name: String,
}

/// Reply of `select_model`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectModelReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_api: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `save_api_key`. An empty `api_key` clears the stored key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveApiKeyBody {
    pub username: String,
    pub model_name: String,
    pub api_key: String,
}

/// Reply of `setting`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SettingReply {
    /// Text content of the topic, if the reply succeeded with any.
    pub fn content(&self) -> Option<String> {
        if !self.success {
            return None;
        }
        match self.messages.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_reply_requires_success_and_username() {
        let ok: AuthReply = serde_json::from_str(r#"{"success":true,"username":"alice"}"#).unwrap();
        assert_eq!(ok.signed_in_as(), Some("alice"));

        let no_name: AuthReply = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(no_name.signed_in_as(), None);

        let failed: AuthReply =
            serde_json::from_str(r#"{"success":false,"error":"wrong password"}"#).unwrap();
        assert_eq!(failed.signed_in_as(), None);
        assert_eq!(failed.error.as_deref(), Some("wrong password"));
    }

    #[test]
    fn auth_status_uses_camel_case_flag() {
        let status: AuthStatus =
            serde_json::from_str(r#"{"isLoggedIn":true,"username":"bob"}"#).unwrap();
        assert_eq!(status.signed_in_as(), Some("bob"));

        let anon: AuthStatus = serde_json::from_str(r#"{"isLoggedIn":false}"#).unwrap();
        assert_eq!(anon.signed_in_as(), None);
    }

    #[test]
    fn history_reply_distinguishes_listing_and_error() {
        let listing: HistoryReply = serde_json::from_str(r#"[]"#).unwrap();
        assert_eq!(listing, HistoryReply::Sessions(Vec::new()));

        let failed: HistoryReply = serde_json::from_str(r#"{"error":"no user"}"#).unwrap();
        assert_eq!(
            failed,
            HistoryReply::Failed {
                error: "no user".to_string()
            }
        );

        assert!(serde_json::from_str::<HistoryReply>(r#""nope""#).is_err());
    }

    #[test]
    fn save_api_key_body_serializes_empty_key_for_clear() {
        let body = SaveApiKeyBody {
            username: "alice".into(),
            model_name: "deepseek-chat".into(),
            api_key: String::new(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""api_key":"""#));
        assert!(json.contains(r#""model_name":"deepseek-chat""#));
    }

    #[test]
    fn setting_reply_content_accepts_text_or_json() {
        let text: SettingReply =
            serde_json::from_str(r#"{"success":true,"messages":"v1.0 notes"}"#).unwrap();
        assert_eq!(text.content().as_deref(), Some("v1.0 notes"));

        let list: SettingReply =
            serde_json::from_str(r#"{"success":true,"messages":["a","b"]}"#).unwrap();
        assert_eq!(list.content().as_deref(), Some(r#"["a","b"]"#));

        let failed: SettingReply =
            serde_json::from_str(r#"{"success":false,"error":"unknown topic"}"#).unwrap();
        assert!(failed.content().is_none());
    }
}
