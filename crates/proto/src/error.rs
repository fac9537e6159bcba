use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(String),
}

/// Errors raised while talking to the chat server.
///
/// Business failures that arrive as `success: false` are not errors at
/// this level; they are carried inside the decoded reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Network/connection-level failure.
    #[error("{0}")]
    Transport(String),

    /// Non-success HTTP status, with the server's `error` text when present.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// 2xx reply that carried only an `error` field.
    #[error("{0}")]
    Server(String),
}

impl ApiError {
    /// Returns the message suitable for user-facing notices.
    ///
    /// Status errors surface only the server text, matching how error
    /// bodies are shown verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
