//! Sidebar, user-info popup and settings panel.

use proto::{ApiError, SettingReply, error_or};
use tracing::debug;

use crate::action::{Command, Request};
use crate::flows::chat::SIGN_IN_FIRST;
use crate::state::{ControllerState, SettingsPanel};

/// Topic answered locally without a server call.
pub const CHECK_UPDATE_TOPIC: &str = "checkUpdate";
pub const UP_TO_DATE: &str = "Already up to date";

impl ControllerState {
    pub(crate) fn toggle_sidebar(&mut self) -> Command {
        if self.session.is_signed_in() {
            self.sidebar_open = !self.sidebar_open;
        }
        Command::None
    }

    pub(crate) fn show_user_info(&mut self) -> Command {
        if self.session.is_signed_in() {
            self.user_info_open = true;
        }
        Command::None
    }

    pub(crate) fn close_user_info(&mut self) -> Command {
        self.user_info_open = false;
        Command::None
    }

    pub(crate) fn open_settings(&mut self) -> Command {
        if !self.session.is_signed_in() {
            return Command::error(SIGN_IN_FIRST);
        }
        self.settings = SettingsPanel::Options;
        Command::None
    }

    pub(crate) fn choose_setting(&mut self, topic: &str) -> Command {
        if self.settings == SettingsPanel::Closed {
            return Command::None;
        }
        if topic == CHECK_UPDATE_TOPIC {
            self.settings = SettingsPanel::Content {
                topic: topic.to_string(),
                text: UP_TO_DATE.to_string(),
            };
            return Command::None;
        }
        debug!(topic = %topic, "Loading setting content");
        self.settings = SettingsPanel::Loading {
            topic: topic.to_string(),
        };
        self.request(Request::Setting {
            topic: topic.to_string(),
        })
    }

    pub(crate) fn back_to_settings(&mut self) -> Command {
        if self.settings != SettingsPanel::Closed {
            self.settings = SettingsPanel::Options;
        }
        Command::None
    }

    pub(crate) fn close_settings(&mut self) -> Command {
        self.settings = SettingsPanel::Closed;
        Command::None
    }

    pub(crate) fn on_setting_loaded(
        &mut self,
        topic: String,
        result: Result<SettingReply, ApiError>,
    ) -> Command {
        // The user may have navigated away while the request was in flight.
        let still_waiting =
            matches!(&self.settings, SettingsPanel::Loading { topic: t } if *t == topic);
        if !still_waiting {
            debug!(topic = %topic, "Dropping setting content for an inactive panel");
            return Command::None;
        }

        self.settings = match result {
            Ok(reply) => match reply.content() {
                Some(text) => SettingsPanel::Content { topic, text },
                None => SettingsPanel::Failed {
                    message: format!(
                        "Failed to load content: {}",
                        error_or(reply.error.as_deref(), "Unknown error")
                    ),
                    topic,
                },
            },
            Err(err) => SettingsPanel::Failed {
                message: format!("Error loading content: {}", err.user_message()),
                topic,
            },
        };
        Command::None
    }
}
