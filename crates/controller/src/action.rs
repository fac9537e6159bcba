//! Elm Architecture (TEA) action and command types for the controller.
//!
//! All state mutations flow through [`Action`], and side effects are
//! expressed as [`Command`] values returned from `ControllerState::update()`.

use proto::{
    Ack, ApiError, AuthReply, AuthStatus, CredentialsBody, HistoryReply, LoadSessionReply,
    ModelCatalog, SaveApiKeyBody, SelectModelBody, SelectModelReply, SendBody, SendReply,
    SessionId, SettingReply,
};

/// Session generation counter. Bumped whenever the signed-in identity
/// changes; completions carrying an older value are dropped.
pub type Epoch = u64;

// ─── Action ──────────────────────────────────────────────────────────────────

/// Every possible state mutation. `ControllerState::update()` is the *only*
/// place where `Action` variants are matched and applied.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Startup / auth ───────────────────────────────────────
    /// Ask the server whether the cookie still carries a valid session.
    RestoreSession,
    /// Switch between the login and register forms.
    ToggleAuthForms,
    /// Submit the login form.
    SubmitLogin { username: String, password: String },
    /// Submit the register form.
    SubmitRegister {
        username: String,
        password: String,
        confirm: String,
    },
    /// Invalidate the server session and clear local state.
    Logout,

    // ── Chat ─────────────────────────────────────────────────
    /// Send a chat message with optimistic local echo.
    SendMessage(String),
    /// Start a new server-side chat session. `confirmed` is the answer of
    /// the UI's yes/no prompt.
    NewChat { confirmed: bool },

    // ── Models ───────────────────────────────────────────────
    /// Re-fetch the model catalog.
    LoadModels,
    /// User picked a model in the selector.
    SelectModel(String),

    // ── API key modal ────────────────────────────────────────
    /// Open the credential modal for a model.
    OpenApiKeyModal(String),
    /// Show or hide the modal's help text.
    ToggleApiKeyHelp,
    /// Save the entered key for the modal's target model.
    SubmitApiKey { key: String, confirmed: bool },
    /// Clear the stored key for the modal's target model.
    ClearApiKey { confirmed: bool },
    /// Close the modal without saving.
    CancelApiKey,

    // ── History ──────────────────────────────────────────────
    /// Reload the history list for the signed-in user.
    LoadHistory,
    /// Replay a stored session. `username` is the identity captured when the
    /// history entry was rendered.
    LoadSession {
        session_id: SessionId,
        username: String,
    },

    // ── Panels ───────────────────────────────────────────────
    ToggleSidebar,
    ShowUserInfo,
    CloseUserInfo,
    OpenSettings,
    /// Pick a topic in the settings panel.
    ChooseSetting(String),
    BackToSettings,
    CloseSettings,

    // ── Network completions ──────────────────────────────────
    /// A request issued at `epoch` finished.
    Completed { epoch: Epoch, outcome: Outcome },
}

/// Why a `select_model` call was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOrigin {
    /// User picked a model that already has a key.
    User,
    /// Startup auto-selection of the first catalog model.
    AutoSelect { requires_key: bool },
}

/// Whether `save_api_key` stores or clears the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    Save,
    Clear,
}

/// Result of a finished [`Request`], tagged with the context the
/// transition needs to apply it.
#[derive(Debug, Clone)]
pub enum Outcome {
    Registered(Result<Ack, ApiError>),
    LoggedIn(Result<AuthReply, ApiError>),
    LoggedOut(Result<Ack, ApiError>),
    AuthChecked(Result<AuthStatus, ApiError>),
    MessageSent(Result<SendReply, ApiError>),
    ChatCreated(Result<Ack, ApiError>),
    HistoryLoaded(Result<HistoryReply, ApiError>),
    SessionLoaded {
        session_id: SessionId,
        result: Result<LoadSessionReply, ApiError>,
    },
    ModelsLoaded {
        auto_select: bool,
        result: Result<ModelCatalog, ApiError>,
    },
    ModelSelected {
        model: String,
        origin: SelectOrigin,
        result: Result<SelectModelReply, ApiError>,
    },
    ApiKeySaved {
        model: String,
        mode: KeyMode,
        result: Result<Ack, ApiError>,
    },
    SettingLoaded {
        topic: String,
        result: Result<SettingReply, ApiError>,
    },
}

// ─── Command ─────────────────────────────────────────────────────────────────

/// One server call. The driver executes it and answers with the matching
/// [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Register(CredentialsBody),
    Login(CredentialsBody),
    Logout,
    CheckAuth,
    Send(SendBody),
    NewChat,
    Sessions {
        user: String,
    },
    LoadSession {
        session_id: SessionId,
        user: String,
    },
    GetModels {
        user: String,
        auto_select: bool,
    },
    SelectModel {
        body: SelectModelBody,
        origin: SelectOrigin,
    },
    SaveApiKey {
        body: SaveApiKeyBody,
        mode: KeyMode,
    },
    Setting {
        topic: String,
    },
}

impl Request {
    /// Endpoint name, used for logging.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::Login(_) => "login",
            Self::Logout => "logout",
            Self::CheckAuth => "check_auth",
            Self::Send(_) => "send",
            Self::NewChat => "new_chat",
            Self::Sessions { .. } => "sessions",
            Self::LoadSession { .. } => "load_session",
            Self::GetModels { .. } => "get_models",
            Self::SelectModel { .. } => "select_model",
            Self::SaveApiKey { .. } => "save_api_key",
            Self::Setting { .. } => "setting",
        }
    }
}

/// Blocking alert-style notification shown by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Input widgets whose typed content the UI layer should wipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    LoginForm,
    RegisterForm,
    Message,
    ApiKey,
}

/// Side effects returned by `ControllerState::update()`. The driver is
/// responsible for executing these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// No side effect.
    None,
    /// Issue a server call captured at `epoch`.
    Request { epoch: Epoch, request: Request },
    /// Show an alert to the user.
    Notify(Notice),
    /// Clear an input widget.
    ClearInput(InputField),
    /// Execute multiple commands in order.
    Batch(Vec<Command>),
}

impl Command {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Notify(Notice::Info(msg.into()))
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Notify(Notice::Error(msg.into()))
    }

    /// Flattens nested batches into a plain list, dropping `None`.
    pub fn into_vec(self) -> Vec<Command> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<Command>) {
        match self {
            Self::None => {}
            Self::Batch(cmds) => {
                for cmd in cmds {
                    cmd.flatten_into(out);
                }
            }
            other => out.push(other),
        }
    }

    /// Requests contained in this command, in execution order.
    pub fn requests(&self) -> Vec<&Request> {
        match self {
            Self::Request { request, .. } => vec![request],
            Self::Batch(cmds) => cmds.iter().flat_map(Command::requests).collect(),
            _ => Vec::new(),
        }
    }
}
