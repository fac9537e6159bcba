//! Wire types shared by the session controller and the CLI frontend.
//!
//! This crate defines the request/response bodies of every chat server
//! endpoint, the grouped model catalog, transcript/history records and the
//! strongly-typed error enums used across the workspace.

pub mod api;
pub mod catalog;
pub mod error;
pub mod message;

/// Re-export of request/response bodies for every endpoint.
pub use api::{
    Ack, AuthReply, AuthStatus, CredentialsBody, HistoryReply, LoadSessionReply, SaveApiKeyBody,
    SelectModelBody, SelectModelReply, SendBody, SendReply, SettingReply,
};
/// Re-export of the model catalog types.
pub use catalog::{Company, Model, ModelCatalog};
/// Re-export of all error types.
pub use error::*;
/// Re-export of transcript and history record types.
pub use message::{HistoryEntry, Sender, SessionId, StoredMessage};

/// Returns `error` when the server supplied a non-empty one, else `fallback`.
///
/// Every endpoint may attach an `error` string to a failed reply; it is
/// shown verbatim to the user when present.
pub fn error_or(error: Option<&str>, fallback: &str) -> String {
    match error.map(str::trim) {
        Some(msg) if !msg.is_empty() => msg.to_string(),
        _ => fallback.to_string(),
    }
}
