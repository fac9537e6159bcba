//! Model catalog loading and model selection.

use proto::{ApiError, ModelCatalog, SelectModelBody, SelectModelReply, error_or};
use tracing::{debug, info, warn};

use crate::action::{Command, Request, SelectOrigin};
use crate::flows::chat::SIGN_IN_FIRST;
use crate::state::ControllerState;

impl ControllerState {
    /// Requests the catalog for the signed-in user; a no-op when signed out.
    pub(crate) fn load_models(&mut self, auto_select: bool) -> Command {
        let Some(user) = self.session.username().map(str::to_string) else {
            return Command::None;
        };
        debug!(user = %user, auto_select, "Loading model catalog");
        self.request(Request::GetModels { user, auto_select })
    }

    pub(crate) fn select_model(&mut self, name: &str) -> Command {
        let name = name.trim();
        if name.is_empty() {
            return Command::None;
        }
        let Some(username) = self.session.username().map(str::to_string) else {
            self.selector.reset();
            return Command::error(SIGN_IN_FIRST);
        };
        let Some(requires_key) = self.catalog.find(name).map(|m| m.requires_key) else {
            warn!(model = %name, "Selected model is not in the catalog");
            self.selector.reset();
            return Command::error(format!("Unknown model: {name}"));
        };

        self.selector.displayed = Some(name.to_string());
        debug!(model = %name, requires_key, "Model chosen");
        if requires_key {
            return self.open_api_key_modal(name);
        }
        self.request(Request::SelectModel {
            body: SelectModelBody {
                username,
                model_name: name.to_string(),
            },
            origin: SelectOrigin::User,
        })
    }

    pub(crate) fn on_models_loaded(
        &mut self,
        auto_select: bool,
        result: Result<ModelCatalog, ApiError>,
    ) -> Command {
        let catalog = match result {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(error = %err, "Model catalog load failed");
                self.catalog.clear();
                self.selector.reset();
                self.sync_selector();
                return Command::error(format!(
                    "Failed to load model list: {}",
                    err.user_message()
                ));
            }
        };

        debug!(
            companies = catalog.companies().len(),
            models = catalog.model_count(),
            "Model catalog loaded"
        );
        self.catalog = catalog;
        let still_listed = self
            .selector
            .committed
            .as_deref()
            .is_some_and(|m| self.catalog.find(m).is_some());
        if !still_listed {
            self.selector.reset();
        }
        self.selector.displayed = self.selector.committed.clone();
        self.sync_selector();

        if auto_select {
            return self.auto_select_first_model();
        }
        Command::None
    }

    /// Startup-only: display the first model of the first company and ask
    /// the server to switch to it.
    fn auto_select_first_model(&mut self) -> Command {
        let Some(first) = self.catalog.first_model().cloned() else {
            debug!("No model available for auto-selection");
            self.selector.reset();
            self.selector.enabled = false;
            return Command::None;
        };
        let Some(username) = self.session.username().map(str::to_string) else {
            return Command::None;
        };
        info!(model = %first.name, "Auto-selecting first model");
        self.selector.displayed = Some(first.name.clone());
        self.request(Request::SelectModel {
            body: SelectModelBody {
                username,
                model_name: first.name,
            },
            origin: SelectOrigin::AutoSelect {
                requires_key: first.requires_key,
            },
        })
    }

    pub(crate) fn on_model_selected(
        &mut self,
        model: String,
        origin: SelectOrigin,
        result: Result<SelectModelReply, ApiError>,
    ) -> Command {
        match result {
            Ok(reply) if reply.success => {
                info!(model = %model, api = ?reply.selected_api, "Server switched model");
                self.selector.commit(&model);
                match origin {
                    SelectOrigin::AutoSelect { requires_key: true } => {
                        self.open_api_key_modal(&model)
                    }
                    _ => Command::None,
                }
            }
            Ok(reply) => {
                warn!(model = %model, error = ?reply.error, "Server rejected model switch");
                self.selector.reset();
                Command::error(format!(
                    "Failed to switch model: {}",
                    error_or(reply.error.as_deref(), "Unknown error")
                ))
            }
            Err(err) => {
                warn!(model = %model, error = %err, "Model switch request failed");
                self.selector.reset();
                Command::error(format!(
                    "Network error while switching model: {}",
                    err.user_message()
                ))
            }
        }
    }
}
