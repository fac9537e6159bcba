//! Credential modal: `Closed -> Open { model, help_visible } -> Closed`.

use proto::{Ack, ApiError, SaveApiKeyBody, error_or};
use tracing::{debug, info, warn};

use crate::action::{Command, InputField, KeyMode, Request};
use crate::flows::chat::SIGN_IN_FIRST;
use crate::state::{ApiKeyModal, ControllerState};

const ENTER_KEY: &str = "Please enter an API key!";
const NOT_SIGNED_IN_SAVE: &str = "Not logged in, cannot save the API key!";
const NOT_SIGNED_IN_CLEAR: &str = "Not logged in, cannot clear the API key!";

impl ControllerState {
    pub(crate) fn open_api_key_modal(&mut self, model: &str) -> Command {
        if !self.session.is_signed_in() {
            return Command::error(SIGN_IN_FIRST);
        }
        debug!(model = %model, "Opening API key modal");
        self.api_key_modal = ApiKeyModal::Open {
            model: model.to_string(),
            help_visible: false,
        };
        Command::ClearInput(InputField::ApiKey)
    }

    pub(crate) fn toggle_api_key_help(&mut self) -> Command {
        if let ApiKeyModal::Open { help_visible, .. } = &mut self.api_key_modal {
            *help_visible = !*help_visible;
        }
        Command::None
    }

    pub(crate) fn cancel_api_key(&mut self) -> Command {
        debug!("API key modal cancelled");
        self.api_key_modal = ApiKeyModal::Closed;
        Command::None
    }

    pub(crate) fn submit_api_key(&mut self, key: &str, confirmed: bool) -> Command {
        let key = key.trim();
        if key.is_empty() {
            return Command::info(ENTER_KEY);
        }
        self.save_key_request(key, KeyMode::Save, confirmed, NOT_SIGNED_IN_SAVE)
    }

    pub(crate) fn clear_api_key(&mut self, confirmed: bool) -> Command {
        self.save_key_request("", KeyMode::Clear, confirmed, NOT_SIGNED_IN_CLEAR)
    }

    /// Shared guard chain of submit and clear.
    fn save_key_request(
        &mut self,
        api_key: &str,
        mode: KeyMode,
        confirmed: bool,
        signed_out_msg: &str,
    ) -> Command {
        let Some(model) = self.api_key_modal.target().map(str::to_string) else {
            warn!(?mode, "API key action without a target model");
            self.api_key_modal = ApiKeyModal::Closed;
            return Command::None;
        };
        let Some(username) = self.session.username().map(str::to_string) else {
            self.api_key_modal = ApiKeyModal::Closed;
            return Command::error(signed_out_msg);
        };
        if !confirmed {
            return Command::None;
        }

        self.api_key_modal = ApiKeyModal::Closed;
        self.loading = true;
        self.request(Request::SaveApiKey {
            body: SaveApiKeyBody {
                username,
                model_name: model,
                api_key: api_key.to_string(),
            },
            mode,
        })
    }

    pub(crate) fn on_api_key_saved(
        &mut self,
        model: String,
        mode: KeyMode,
        result: Result<Ack, ApiError>,
    ) -> Command {
        self.loading = false;
        match (mode, result) {
            (KeyMode::Save, Ok(ack)) if ack.success => {
                info!(model = %model, "API key saved");
                self.catalog.set_requires_key(&model, false);
                self.selector.commit(&model);
                Command::info(format!(
                    "API key for {model} saved. The service has been restarted."
                ))
            }
            (KeyMode::Save, Ok(ack)) => {
                warn!(model = %model, error = ?ack.error, "API key save rejected");
                self.selector.reset();
                Command::error(format!(
                    "Failed to save API key: {}",
                    error_or(ack.error.as_deref(), "Unknown error")
                ))
            }
            (KeyMode::Save, Err(err)) => {
                warn!(model = %model, error = %err, "API key save failed");
                self.selector.reset();
                Command::error(format!(
                    "Network error while saving API key: {}",
                    err.user_message()
                ))
            }
            (KeyMode::Clear, Ok(ack)) if ack.success => {
                info!(model = %model, "API key cleared");
                self.catalog.set_requires_key(&model, true);
                self.selector.reset();
                Command::info(format!(
                    "API key for {model} cleared. The service has been restarted."
                ))
            }
            // Clear failures leave the selector as it was.
            (KeyMode::Clear, Ok(ack)) => Command::error(format!(
                "Failed to clear API key: {}",
                error_or(ack.error.as_deref(), "Unknown error")
            )),
            (KeyMode::Clear, Err(err)) => {
                warn!(model = %model, error = %err, "API key clear failed");
                Command::error(format!(
                    "Network error while clearing API key: {}",
                    err.user_message()
                ))
            }
        }
    }
}
