//! Login, registration, logout and startup session restore.

use proto::{Ack, ApiError, AuthReply, AuthStatus, CredentialsBody, error_or};
use tracing::{debug, info, warn};

use crate::action::{Command, InputField, Request};
use crate::digest::hash_password;
use crate::error::{validate_login, validate_registration};
use crate::state::{ApiKeyModal, AuthForm, ControllerState, HistoryView, Screen, SettingsPanel};

const LOGIN_FAILED: &str = "Login failed, check username and password.";
const LOGIN_ERROR: &str = "An error occurred during login.";
const REGISTER_FAILED: &str = "Registration failed, please try again later.";
const REGISTER_ERROR: &str = "An error occurred during registration.";
const REGISTERED: &str = "Registration successful, please log in.";
const LOGOUT_FAILED: &str = "Logout failed, please try again later.";
const LOGOUT_NETWORK: &str = "Network error during logout.";
const CHECK_AUTH_UNREACHABLE: &str = "Cannot reach server to check status";
const CHECK_AUTH_NOTICE: &str = "Unable to connect to the server to check login status.";

impl ControllerState {
    pub(crate) fn restore_session(&mut self) -> Command {
        if !self.accepts_login() {
            debug!("Session check ignored, already signed in");
            return Command::None;
        }
        debug!("Checking server session");
        self.request(Request::CheckAuth)
    }

    pub(crate) fn toggle_auth_forms(&mut self) -> Command {
        self.login_error = None;
        self.register_error = None;
        self.screen = match self.screen {
            Screen::Auth(AuthForm::Login) => Screen::Auth(AuthForm::Register),
            Screen::Auth(AuthForm::Register) => Screen::Auth(AuthForm::Login),
            Screen::Main => Screen::Main,
        };
        Command::None
    }

    pub(crate) fn submit_login(&mut self, username: &str, password: &str) -> Command {
        if !self.accepts_login() {
            debug!("Login ignored outside the login form");
            return Command::None;
        }
        self.login_error = None;
        let username = match validate_login(username, password) {
            Ok(name) => name,
            Err(err) => {
                self.login_error = Some(err.to_string());
                return Command::None;
            }
        };
        self.request(Request::Login(CredentialsBody {
            username: username.to_string(),
            password: hash_password(password),
        }))
    }

    pub(crate) fn submit_register(
        &mut self,
        username: &str,
        password: &str,
        confirm: &str,
    ) -> Command {
        self.register_error = None;
        let username = match validate_registration(username, password, confirm) {
            Ok(name) => name,
            Err(err) => {
                self.register_error = Some(err.to_string());
                return Command::None;
            }
        };
        self.request(Request::Register(CredentialsBody {
            username: username.to_string(),
            password: hash_password(password),
        }))
    }

    pub(crate) fn logout(&mut self) -> Command {
        let Some(username) = self.session.username() else {
            return Command::None;
        };
        info!(user = %username, "Requesting logout");
        self.request(Request::Logout)
    }

    pub(crate) fn on_registered(&mut self, result: Result<Ack, ApiError>) -> Command {
        match result {
            Ok(ack) if ack.success => {
                self.register_error = None;
                self.login_error = None;
                self.screen = Screen::Auth(AuthForm::Login);
                Command::Batch(vec![
                    Command::info(REGISTERED),
                    Command::ClearInput(InputField::RegisterForm),
                ])
            }
            Ok(ack) => {
                self.register_error = Some(error_or(ack.error.as_deref(), REGISTER_FAILED));
                Command::None
            }
            Err(err) => {
                warn!(error = %err, "Register request failed");
                self.register_error = Some(REGISTER_ERROR.to_string());
                Command::None
            }
        }
    }

    pub(crate) fn on_logged_in(&mut self, result: Result<AuthReply, ApiError>) -> Command {
        match result {
            Ok(reply) => match reply.signed_in_as() {
                Some(username) => {
                    let username = username.to_string();
                    Command::Batch(vec![
                        self.begin_session(username, false),
                        Command::ClearInput(InputField::LoginForm),
                    ])
                }
                None => {
                    self.login_error = Some(error_or(reply.error.as_deref(), LOGIN_FAILED));
                    self.reset_signed_out();
                    Command::None
                }
            },
            Err(err) => {
                warn!(error = %err, "Login request failed");
                self.login_error = Some(LOGIN_ERROR.to_string());
                self.reset_signed_out();
                Command::None
            }
        }
    }

    pub(crate) fn on_logged_out(&mut self, result: Result<Ack, ApiError>) -> Command {
        match result {
            Ok(ack) if ack.success => {
                info!("Logged out");
                self.reset_signed_out();
                self.user_info_open = false;
                self.transcript.clear();
                self.history = HistoryView::Blank;
                Command::None
            }
            Ok(ack) => {
                warn!(error = ?ack.error, "Server rejected logout");
                Command::error(LOGOUT_FAILED)
            }
            Err(err) => {
                warn!(error = %err, "Logout request failed");
                Command::error(LOGOUT_NETWORK)
            }
        }
    }

    pub(crate) fn on_auth_checked(&mut self, result: Result<AuthStatus, ApiError>) -> Command {
        match result {
            Ok(status) => match status.signed_in_as() {
                Some(username) => {
                    info!(user = %username, "Server session restored");
                    let username = username.to_string();
                    self.begin_session(username, true)
                }
                None => {
                    debug!("No server session, showing login");
                    self.reset_signed_out();
                    self.history = HistoryView::Blank;
                    Command::None
                }
            },
            Err(err) => {
                warn!(error = %err, "Session check failed");
                self.reset_signed_out();
                self.history = HistoryView::Failed(CHECK_AUTH_UNREACHABLE.to_string());
                Command::error(CHECK_AUTH_NOTICE)
            }
        }
    }

    /// Post-login sequence shared by interactive login and restore: set the
    /// identity, reveal the main UI, then request history and models.
    fn begin_session(&mut self, username: String, auto_select: bool) -> Command {
        self.session.begin(username);
        self.screen = Screen::Main;
        self.transcript.clear();
        self.user_info_open = false;
        self.login_error = None;
        self.loading = false;
        Command::Batch(vec![self.load_history(), self.load_models(auto_select)])
    }

    /// Login and session restore only run from the login form while signed out.
    fn accepts_login(&self) -> bool {
        !self.session.is_signed_in() && self.screen == Screen::Auth(AuthForm::Login)
    }

    /// Clears identity, catalog and selector and shows the login form.
    fn reset_signed_out(&mut self) {
        self.session.end();
        self.screen = Screen::Auth(AuthForm::Login);
        self.catalog.clear();
        self.selector.reset();
        self.api_key_modal = ApiKeyModal::Closed;
        self.settings = SettingsPanel::Closed;
        self.sidebar_open = false;
        self.loading = false;
        self.sync_selector();
    }
}
