//! Controller state: the session context plus read-only UI projections.
//!
//! [`ControllerState`] is the single owner of everything the UI shows.
//! Rendering code reads it through accessors; all mutation goes through
//! [`ControllerState::update`].

use proto::{ModelCatalog, SessionId};
use tracing::debug;

use crate::action::{Action, Command, Epoch, Outcome, Request};
use crate::render::Bubble;

// ─── Session context ─────────────────────────────────────────────────────────

/// Authenticated identity and its generation counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    username: Option<String>,
    epoch: Epoch,
}

impl SessionContext {
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_signed_in(&self) -> bool {
        self.username.is_some()
    }

    /// `true` when `username` is the live identity.
    pub fn owns(&self, username: &str) -> bool {
        !username.is_empty() && self.username.as_deref() == Some(username)
    }

    pub(crate) fn begin(&mut self, username: String) {
        self.username = Some(username);
        self.epoch += 1;
    }

    /// Clears the identity. The epoch only advances if one was set.
    pub(crate) fn end(&mut self) {
        if self.username.take().is_some() {
            self.epoch += 1;
        }
    }
}

// ─── Projections ─────────────────────────────────────────────────────────────

/// Which auth form is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthForm {
    Login,
    Register,
}

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Auth overlay active.
    Auth(AuthForm),
    /// Main chat UI revealed.
    Main,
}

/// One rendered row of the history list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub session_id: SessionId,
    pub time_label: String,
    pub preview: String,
}

/// What the history list currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HistoryView {
    /// Nothing rendered.
    #[default]
    Blank,
    /// Placeholder asking the user to sign in.
    SignInRequired,
    /// Server returned an empty listing.
    NoSessions,
    /// Error placeholder.
    Failed(String),
    /// Rendered rows; `owner` is the identity the rows were loaded for.
    Entries {
        owner: String,
        items: Vec<HistoryItem>,
    },
}

impl HistoryView {
    /// Builds the replay action for row `index`, capturing the owner the
    /// row was rendered for rather than the live identity.
    pub fn open_action(&self, index: usize) -> Option<Action> {
        match self {
            Self::Entries { owner, items } => items.get(index).map(|item| Action::LoadSession {
                session_id: item.session_id.clone(),
                username: owner.clone(),
            }),
            _ => None,
        }
    }
}

/// One option in a selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOption {
    pub name: String,
    pub requires_key: bool,
}

/// One labeled group of the selector, one per catalog company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorGroup {
    pub label: String,
    pub options: Vec<SelectorOption>,
}

/// Model selector value and enablement. Options are derived from the
/// catalog, see [`ControllerState::selector_groups`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSelector {
    /// Value currently shown; `None` is the placeholder.
    pub displayed: Option<String>,
    /// Last model the server confirmed (or that a key save committed).
    pub committed: Option<String>,
    pub enabled: bool,
}

impl ModelSelector {
    /// Returns to the placeholder state.
    pub(crate) fn reset(&mut self) {
        self.displayed = None;
        self.committed = None;
    }

    pub(crate) fn commit(&mut self, model: &str) {
        self.displayed = Some(model.to_string());
        self.committed = Some(model.to_string());
    }
}

/// Credential modal state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ApiKeyModal {
    #[default]
    Closed,
    Open {
        model: String,
        help_visible: bool,
    },
}

impl ApiKeyModal {
    /// The pending API-key target model, if the modal is open.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Open { model, .. } => Some(model),
            Self::Closed => None,
        }
    }
}

/// Settings panel state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SettingsPanel {
    #[default]
    Closed,
    /// Option list visible.
    Options,
    Loading {
        topic: String,
    },
    Content {
        topic: String,
        text: String,
    },
    Failed {
        topic: String,
        message: String,
    },
}

/// Avatar initial and account label for the user-info popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBadge {
    pub avatar: String,
    pub label: String,
}

// ─── ControllerState ─────────────────────────────────────────────────────────

/// Full client state.
#[derive(Debug, Clone)]
pub struct ControllerState {
    pub(crate) session: SessionContext,
    pub(crate) catalog: ModelCatalog,
    pub(crate) screen: Screen,
    pub(crate) login_error: Option<String>,
    pub(crate) register_error: Option<String>,
    pub(crate) transcript: Vec<Bubble>,
    pub(crate) history: HistoryView,
    pub(crate) selector: ModelSelector,
    pub(crate) api_key_modal: ApiKeyModal,
    pub(crate) loading: bool,
    pub(crate) sidebar_open: bool,
    pub(crate) user_info_open: bool,
    pub(crate) settings: SettingsPanel,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerState {
    /// Signed-out state with the login form showing.
    pub fn new() -> Self {
        Self {
            session: SessionContext::default(),
            catalog: ModelCatalog::default(),
            screen: Screen::Auth(AuthForm::Login),
            login_error: None,
            register_error: None,
            transcript: Vec::new(),
            history: HistoryView::Blank,
            selector: ModelSelector::default(),
            api_key_modal: ApiKeyModal::Closed,
            loading: false,
            sidebar_open: false,
            user_info_open: false,
            settings: SettingsPanel::Closed,
        }
    }

    // ── Read-only projections ────────────────────────────────

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn username(&self) -> Option<&str> {
        self.session.username()
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn login_error(&self) -> Option<&str> {
        self.login_error.as_deref()
    }

    pub fn register_error(&self) -> Option<&str> {
        self.register_error.as_deref()
    }

    pub fn transcript(&self) -> &[Bubble] {
        &self.transcript
    }

    pub fn history(&self) -> &HistoryView {
        &self.history
    }

    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    /// Selector option groups, one per company, in catalog order.
    pub fn selector_groups(&self) -> Vec<SelectorGroup> {
        self.catalog
            .companies()
            .iter()
            .map(|company| SelectorGroup {
                label: company.name.clone(),
                options: company
                    .models
                    .iter()
                    .map(|m| SelectorOption {
                        name: m.name.clone(),
                        requires_key: m.requires_key,
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn api_key_modal(&self) -> &ApiKeyModal {
        &self.api_key_modal
    }

    /// `true` while a blocking network call is in progress.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn is_user_info_open(&self) -> bool {
        self.user_info_open
    }

    pub fn settings(&self) -> &SettingsPanel {
        &self.settings
    }

    /// Avatar and account label; `None` when signed out.
    pub fn user_badge(&self) -> Option<UserBadge> {
        let name = self.session.username()?;
        let avatar = name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect::<String>())
            .unwrap_or_default();
        Some(UserBadge {
            avatar,
            label: format!("Account: {name}"),
        })
    }

    // ── Update ───────────────────────────────────────────────

    /// Applies one action and returns the side effects to execute.
    pub fn update(&mut self, action: Action) -> Command {
        match action {
            Action::RestoreSession => self.restore_session(),
            Action::ToggleAuthForms => self.toggle_auth_forms(),
            Action::SubmitLogin { username, password } => self.submit_login(&username, &password),
            Action::SubmitRegister {
                username,
                password,
                confirm,
            } => self.submit_register(&username, &password, &confirm),
            Action::Logout => self.logout(),

            Action::SendMessage(text) => self.send_message(&text),
            Action::NewChat { confirmed } => self.new_chat(confirmed),

            Action::LoadModels => self.load_models(false),
            Action::SelectModel(name) => self.select_model(&name),

            Action::OpenApiKeyModal(model) => self.open_api_key_modal(&model),
            Action::ToggleApiKeyHelp => self.toggle_api_key_help(),
            Action::SubmitApiKey { key, confirmed } => self.submit_api_key(&key, confirmed),
            Action::ClearApiKey { confirmed } => self.clear_api_key(confirmed),
            Action::CancelApiKey => self.cancel_api_key(),

            Action::LoadHistory => self.load_history(),
            Action::LoadSession {
                session_id,
                username,
            } => self.load_session(session_id, &username),

            Action::ToggleSidebar => self.toggle_sidebar(),
            Action::ShowUserInfo => self.show_user_info(),
            Action::CloseUserInfo => self.close_user_info(),
            Action::OpenSettings => self.open_settings(),
            Action::ChooseSetting(topic) => self.choose_setting(&topic),
            Action::BackToSettings => self.back_to_settings(),
            Action::CloseSettings => self.close_settings(),

            Action::Completed { epoch, outcome } => {
                if epoch != self.session.epoch() {
                    debug!(
                        issued = epoch,
                        current = self.session.epoch(),
                        "Discarding stale completion"
                    );
                    return Command::None;
                }
                self.apply_outcome(outcome)
            }
        }
    }

    fn apply_outcome(&mut self, outcome: Outcome) -> Command {
        match outcome {
            Outcome::Registered(result) => self.on_registered(result),
            Outcome::LoggedIn(result) => self.on_logged_in(result),
            Outcome::LoggedOut(result) => self.on_logged_out(result),
            Outcome::AuthChecked(result) => self.on_auth_checked(result),
            Outcome::MessageSent(result) => self.on_message_sent(result),
            Outcome::ChatCreated(result) => self.on_chat_created(result),
            Outcome::HistoryLoaded(result) => self.on_history_loaded(result),
            Outcome::SessionLoaded { session_id, result } => {
                self.on_session_loaded(session_id, result)
            }
            Outcome::ModelsLoaded {
                auto_select,
                result,
            } => self.on_models_loaded(auto_select, result),
            Outcome::ModelSelected {
                model,
                origin,
                result,
            } => self.on_model_selected(model, origin, result),
            Outcome::ApiKeySaved {
                model,
                mode,
                result,
            } => self.on_api_key_saved(model, mode, result),
            Outcome::SettingLoaded { topic, result } => self.on_setting_loaded(topic, result),
        }
    }

    // ── Shared helpers ───────────────────────────────────────

    /// Wraps `request` with the current epoch.
    pub(crate) fn request(&self, request: Request) -> Command {
        Command::Request {
            epoch: self.session.epoch(),
            request,
        }
    }

    /// Re-derives selector enablement from identity and catalog.
    pub(crate) fn sync_selector(&mut self) {
        self.selector.enabled = self.session.is_signed_in() && !self.catalog.is_empty();
    }
}
