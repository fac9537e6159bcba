//! Message exchange and new-chat handling.

use proto::{Ack, ApiError, SendBody, SendReply, error_or};
use tracing::{debug, warn};

use crate::action::{Command, InputField, Request};
use crate::render::Bubble;
use crate::state::ControllerState;

pub const SIGN_IN_FIRST: &str = "Please log in first!";

impl ControllerState {
    pub(crate) fn send_message(&mut self, text: &str) -> Command {
        let message = text.trim();
        if message.is_empty() {
            return Command::None;
        }
        let Some(username) = self.session.username().map(str::to_string) else {
            return Command::error(SIGN_IN_FIRST);
        };

        // Optimistic echo; kept even if the send fails.
        self.transcript.push(Bubble::user(message));
        Command::Batch(vec![
            Command::ClearInput(InputField::Message),
            self.request(Request::Send(SendBody {
                message: message.to_string(),
                username,
            })),
        ])
    }

    pub(crate) fn new_chat(&mut self, confirmed: bool) -> Command {
        if !self.session.is_signed_in() {
            return Command::error(SIGN_IN_FIRST);
        }
        if !confirmed {
            return Command::None;
        }
        self.request(Request::NewChat)
    }

    pub(crate) fn on_message_sent(&mut self, result: Result<SendReply, ApiError>) -> Command {
        match result {
            Ok(reply) if reply.success => {
                self.transcript
                    .push(Bubble::ai(reply.response.unwrap_or_default()));
                Command::None
            }
            Ok(reply) => Command::error(error_or(reply.error.as_deref(), "Unknown error")),
            Err(err) => {
                warn!(error = %err, "Send failed");
                Command::error(format!(
                    "Error communicating with the server: {}",
                    err.user_message()
                ))
            }
        }
    }

    pub(crate) fn on_chat_created(&mut self, result: Result<Ack, ApiError>) -> Command {
        match result {
            Ok(ack) if ack.success => {
                debug!("New chat created, reloading history");
                self.transcript.clear();
                self.load_history()
            }
            Ok(ack) => Command::error(error_or(ack.error.as_deref(), "Unknown error")),
            Err(err) => Command::error(format!(
                "Error creating a new chat: {}",
                err.user_message()
            )),
        }
    }
}
