//! History listing and stored-session replay.

use proto::{ApiError, HistoryReply, LoadSessionReply, SessionId, error_or};
use tracing::{debug, warn};

use crate::action::{Command, Request};
use crate::render::{Bubble, format_last_time, preview_text};
use crate::state::{ControllerState, HistoryItem, HistoryView};

pub const SIGN_IN_FOR_HISTORY: &str = "Please log in to view history.";
pub const NO_SESSIONS: &str = "No history sessions.";
const SESSION_DENIED: &str =
    "Cannot load session: user state invalid or insufficient permissions.";

impl ControllerState {
    pub(crate) fn load_history(&mut self) -> Command {
        let Some(user) = self.session.username().map(str::to_string) else {
            self.history = HistoryView::SignInRequired;
            return Command::None;
        };
        debug!(user = %user, "Loading history");
        self.request(Request::Sessions { user })
    }

    pub(crate) fn on_history_loaded(&mut self, result: Result<HistoryReply, ApiError>) -> Command {
        // The listing belongs to whoever is signed in now; the epoch check
        // already rejected anything issued for a previous identity.
        let Some(owner) = self.session.username().map(str::to_string) else {
            self.history = HistoryView::SignInRequired;
            return Command::None;
        };

        self.history = match result {
            Ok(HistoryReply::Failed { error }) => {
                warn!(error = %error, "Server refused history listing");
                HistoryView::Failed(format!("Failed to load history: {error}"))
            }
            Ok(HistoryReply::Sessions(entries)) if entries.is_empty() => HistoryView::NoSessions,
            Ok(HistoryReply::Sessions(entries)) => {
                debug!(count = entries.len(), "History loaded");
                let items = entries
                    .into_iter()
                    .map(|entry| HistoryItem {
                        time_label: format_last_time(entry.last_time.as_ref()),
                        preview: preview_text(entry.preview.as_deref()),
                        session_id: entry.session_id,
                    })
                    .collect();
                HistoryView::Entries { owner, items }
            }
            Err(ApiError::Decode(reason)) => {
                warn!(%reason, "History listing was not an array");
                HistoryView::Failed("Failed to load history: malformed response".into())
            }
            Err(ApiError::Status { message, .. }) | Err(ApiError::Server(message)) => {
                HistoryView::Failed(format!("Failed to load history: {message}"))
            }
            Err(err) => {
                warn!(error = %err, "History request failed");
                HistoryView::Failed(format!("Error loading history: {}", err.user_message()))
            }
        };
        Command::None
    }

    pub(crate) fn load_session(&mut self, session_id: SessionId, username: &str) -> Command {
        if !self.session.owns(username) {
            warn!(
                session = %session_id,
                requested_by = %username,
                current = ?self.session.username(),
                "Session replay refused for a different identity"
            );
            return Command::error(SESSION_DENIED);
        }
        debug!(session = %session_id, "Loading session");
        self.request(Request::LoadSession {
            session_id,
            user: username.to_string(),
        })
    }

    pub(crate) fn on_session_loaded(
        &mut self,
        session_id: SessionId,
        result: Result<LoadSessionReply, ApiError>,
    ) -> Command {
        match result {
            Ok(reply) if reply.success => {
                debug!(session = %session_id, messages = reply.messages.len(), "Session replayed");
                self.transcript = reply
                    .messages
                    .into_iter()
                    .map(|m| Bubble::new(m.sender, m.text))
                    .collect();
                self.sidebar_open = false;
                Command::None
            }
            Ok(reply) => Command::error(error_or(
                reply.error.as_deref(),
                &format!("Cannot load session {session_id}"),
            )),
            Err(err) => Command::error(format!(
                "Network error while loading session: {}",
                err.user_message()
            )),
        }
    }
}
