//! Line-oriented interactive frontend.
//!
//! Reads slash commands or chat text from stdin, drives the controller and
//! prints whatever changed. Yes/no prompts answer the controller's
//! confirmation flags.

use anyhow::Result;
use controller::{
    Action, AuthForm, Bubble, Controller, Screen, UiEffect, flows::panels::CHECK_UPDATE_TOPIC,
};
use proto::SessionId;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::view::{
    API_KEY_HELP, PROMPT, format_bubble, format_effect, format_history, format_models,
    format_settings, format_user_info,
};

const PASSWORD_PROMPT: &str = "Password (visible as typed): ";

const HELP: &str = "\
Commands:
  /login [user]       sign in
  /register [user]    create an account
  /logout             sign out
  /whoami             show the signed-in account
  /models             list models
  /model <name>       switch model
  /key [model]        set or clear the API key of a model
  /history            list past sessions
  /open <n>           replay session n from /history
  /new                start a new chat
  /settings [topic]   show settings or one settings topic
  /help               this text
  /quit               exit
Anything else is sent as a chat message.
Passwords are echoed as you type them.";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Quit,
    Login(Option<String>),
    Register(Option<String>),
    Logout,
    WhoAmI,
    Models,
    Model(String),
    Key(Option<String>),
    History,
    Open(usize),
    New,
    Settings(Option<String>),
    Send(String),
}

/// Parses one input line. `Ok(None)` for blank input.
pub fn parse_command(line: &str) -> Result<Option<ReplCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(ReplCommand::Send(line.to_string())));
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim().to_string()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };
    let cmd = match name {
        "help" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        "login" => ReplCommand::Login(arg),
        "register" => ReplCommand::Register(arg),
        "logout" => ReplCommand::Logout,
        "whoami" => ReplCommand::WhoAmI,
        "models" => ReplCommand::Models,
        "model" => ReplCommand::Model(arg.ok_or("Usage: /model <name>")?),
        "key" => ReplCommand::Key(arg),
        "history" => ReplCommand::History,
        "open" => {
            let n = arg
                .and_then(|a| a.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .ok_or("Usage: /open <n> (see /history)")?;
            ReplCommand::Open(n)
        }
        "new" => ReplCommand::New,
        "settings" => ReplCommand::Settings(arg),
        other => return Err(format!("Unknown command: /{other}. Type /help.")),
    };
    Ok(Some(cmd))
}

/// Prompted line I/O over any async reader/writer pair.
pub struct Terminal<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin> Terminal<R, W> {
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
        }
    }

    pub async fn say(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }

    /// Prints `label` and reads one line. `None` on end of input.
    pub async fn ask(&mut self, label: &str) -> Result<Option<String>> {
        self.out.write_all(label.as_bytes()).await?;
        self.out.flush().await?;
        Ok(self.lines.next_line().await?)
    }

    pub async fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} [y/N] ")).await?;
        Ok(matches!(
            answer.as_deref().map(str::trim),
            Some("y" | "Y" | "yes" | "Yes")
        ))
    }
}

/// Interactive session over a [`Controller`].
pub struct Repl<R, W> {
    controller: Controller,
    term: Terminal<R, W>,
    client: ClientConfig,
    /// Transcript as last printed.
    shown: Vec<Bubble>,
}

impl<R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin> Repl<R, W> {
    pub fn new(controller: Controller, term: Terminal<R, W>, client: ClientConfig) -> Self {
        Self {
            controller,
            term,
            client,
            shown: Vec::new(),
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Runs until `/quit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        if self.client.auto_restore {
            self.restore().await?;
        }
        if self.controller.state().username().is_none() {
            self.term
                .say("Not signed in. Use /login or /register, /help for commands.")
                .await?;
        }

        while let Some(line) = self.term.ask(PROMPT).await? {
            match parse_command(&line) {
                Ok(None) => {}
                Ok(Some(ReplCommand::Quit)) => break,
                Ok(Some(cmd)) => self.execute(cmd).await?,
                Err(msg) => self.term.say(&msg).await?,
            }
        }
        info!("Interactive session ended");
        Ok(())
    }

    async fn execute(&mut self, cmd: ReplCommand) -> Result<()> {
        debug!(?cmd, "Executing command");
        match cmd {
            ReplCommand::Help => self.term.say(HELP).await?,
            ReplCommand::Quit => {}
            ReplCommand::Login(user) => {
                self.login(user).await?;
            }
            ReplCommand::Register(user) => {
                self.register(user).await?;
            }
            ReplCommand::Logout => {
                self.step(Action::Logout).await?;
                if self.controller.state().username().is_none() {
                    self.shown.clear();
                    self.term.say("Signed out.").await?;
                }
            }
            ReplCommand::WhoAmI => {
                self.step(Action::ShowUserInfo).await?;
                let text = format_user_info(self.controller.state())
                    .unwrap_or_else(|| "Not signed in.".to_string());
                self.term.say(&text).await?;
                self.step(Action::CloseUserInfo).await?;
            }
            ReplCommand::Models => {
                self.step(Action::LoadModels).await?;
                let text = format_models(self.controller.state());
                self.term.say(&text).await?;
            }
            ReplCommand::Model(name) => {
                self.step(Action::SelectModel(name)).await?;
                self.handle_api_key_modal().await?;
                if let Some(model) = self.controller.state().selector().committed.clone() {
                    self.term.say(&format!("Active model: {model}")).await?;
                }
            }
            ReplCommand::Key(model) => {
                let target = model.or_else(|| self.controller.state().selector().displayed.clone());
                match target {
                    Some(model) => {
                        self.step(Action::OpenApiKeyModal(model)).await?;
                        self.handle_api_key_modal().await?;
                    }
                    None => self.term.say("Usage: /key <model>").await?,
                }
            }
            ReplCommand::History => {
                if !self.controller.state().is_sidebar_open() {
                    self.step(Action::ToggleSidebar).await?;
                }
                self.step(Action::LoadHistory).await?;
                let text = format_history(self.controller.state().history());
                self.term.say(&text).await?;
            }
            ReplCommand::Open(n) => {
                let Some(action) = self.controller.state().history().open_action(n - 1) else {
                    self.term.say("No such history entry; run /history first.").await?;
                    return Ok(());
                };
                self.replay(action).await?;
            }
            ReplCommand::New => {
                let confirmed = self.controller.state().username().is_none()
                    || self
                        .term
                        .confirm(
                            "Start a new chat? The current conversation stays in history.",
                        )
                        .await?;
                self.step(Action::NewChat { confirmed }).await?;
                self.print_transcript().await?;
            }
            ReplCommand::Settings(topic) => self.settings(topic).await?,
            ReplCommand::Send(text) => {
                self.step(Action::SendMessage(text)).await?;
                self.print_transcript().await?;
            }
        }
        Ok(())
    }

    /// Startup session check.
    pub async fn restore(&mut self) -> Result<()> {
        self.step(Action::RestoreSession).await?;
        self.handle_api_key_modal().await?;
        if let Some(user) = self.controller.state().username() {
            let text = format!("Welcome back, {user}.");
            self.term.say(&text).await?;
        }
        Ok(())
    }

    /// Prompts for missing credentials and signs in. Returns whether a
    /// session is active afterwards.
    pub async fn login(&mut self, username: Option<String>) -> Result<bool> {
        if let Some(user) = self.controller.state().username() {
            let text = format!("Already signed in as {user}. Use /logout first.");
            self.term.say(&text).await?;
            return Ok(true);
        }
        if self.controller.state().screen() == Screen::Auth(AuthForm::Register) {
            self.step(Action::ToggleAuthForms).await?;
        }
        let Some(username) = self.resolve_username(username).await? else {
            return Ok(false);
        };
        let password = self.term.ask(PASSWORD_PROMPT).await?.unwrap_or_default();

        self.step(Action::SubmitLogin { username, password }).await?;
        if let Some(err) = self.controller.state().login_error() {
            let err = err.to_string();
            self.term.say(&err).await?;
            return Ok(false);
        }
        if let Some(user) = self.controller.state().username() {
            let text = format!("Signed in as {user}.");
            self.term.say(&text).await?;
        }
        Ok(self.controller.state().username().is_some())
    }

    /// Prompts for the registration form and submits it.
    pub async fn register(&mut self, username: Option<String>) -> Result<bool> {
        if self.controller.state().username().is_some() {
            self.term.say("Sign out before registering a new account.").await?;
            return Ok(false);
        }
        if self.controller.state().screen() == Screen::Auth(AuthForm::Login) {
            self.step(Action::ToggleAuthForms).await?;
        }
        let Some(username) = self.resolve_username(username).await? else {
            return Ok(false);
        };
        let password = self.term.ask(PASSWORD_PROMPT).await?.unwrap_or_default();
        let confirm = self.term.ask("Confirm password: ").await?.unwrap_or_default();

        self.step(Action::SubmitRegister {
            username,
            password,
            confirm,
        })
        .await?;
        if let Some(err) = self.controller.state().register_error() {
            let err = err.to_string();
            self.term.say(&err).await?;
            return Ok(false);
        }
        Ok(self.controller.state().screen() == Screen::Auth(AuthForm::Login))
    }

    /// Signs out if a session is active.
    pub async fn logout(&mut self) -> Result<()> {
        if self.controller.state().username().is_some() {
            self.step(Action::Logout).await?;
        }
        Ok(())
    }

    /// Loads a stored session and prints it.
    pub async fn replay(&mut self, action: Action) -> Result<()> {
        if let Action::LoadSession { session_id, .. } = &action {
            debug!(session = %session_id, "Replaying session");
        }
        self.step(action).await?;
        self.print_transcript().await
    }

    pub async fn print_models(&mut self) -> Result<()> {
        let text = format_models(self.controller.state());
        self.term.say(&text).await
    }

    pub async fn print_history(&mut self) -> Result<()> {
        let text = format_history(self.controller.state().history());
        self.term.say(&text).await
    }

    async fn resolve_username(&mut self, given: Option<String>) -> Result<Option<String>> {
        if let Some(name) = given {
            return Ok(Some(name));
        }
        let label = match &self.client.username {
            Some(default) => format!("Username [{default}]: "),
            None => "Username: ".to_string(),
        };
        let Some(typed) = self.term.ask(&label).await? else {
            return Ok(None);
        };
        let typed = typed.trim();
        if typed.is_empty() {
            return Ok(Some(self.client.username.clone().unwrap_or_default()));
        }
        Ok(Some(typed.to_string()))
    }

    async fn settings(&mut self, topic: Option<String>) -> Result<()> {
        self.step(Action::OpenSettings).await?;
        let Some(topic) = topic else {
            if let Some(text) = format_settings(self.controller.state().settings()) {
                self.term.say(&text).await?;
            }
            return Ok(());
        };
        let topic = if topic.eq_ignore_ascii_case("checkupdate") {
            CHECK_UPDATE_TOPIC.to_string()
        } else {
            topic
        };
        self.step(Action::ChooseSetting(topic)).await?;
        if let Some(text) = format_settings(self.controller.state().settings()) {
            self.term.say(&text).await?;
        }
        self.step(Action::CloseSettings).await?;
        Ok(())
    }

    /// Keeps prompting while the credential modal is open.
    async fn handle_api_key_modal(&mut self) -> Result<()> {
        while let Some(model) = self
            .controller
            .state()
            .api_key_modal()
            .target()
            .map(str::to_string)
        {
            let label =
                format!("API key for {model} ('?' for help, 'clear' to remove, empty to cancel): ");
            let Some(input) = self.term.ask(&label).await? else {
                self.step(Action::CancelApiKey).await?;
                break;
            };
            match input.trim() {
                "" => self.step(Action::CancelApiKey).await?,
                "?" => {
                    self.step(Action::ToggleApiKeyHelp).await?;
                    if matches!(
                        self.controller.state().api_key_modal(),
                        controller::ApiKeyModal::Open {
                            help_visible: true,
                            ..
                        }
                    ) {
                        self.term.say(API_KEY_HELP).await?;
                    }
                }
                "clear" => {
                    let confirmed = self
                        .term
                        .confirm(&format!(
                            "Clear the stored API key for \"{model}\"? The next use will ask for a key again."
                        ))
                        .await?;
                    self.step(Action::ClearApiKey { confirmed }).await?;
                }
                key => {
                    let confirmed = self
                        .term
                        .confirm(&format!("Save this API key for model \"{model}\"?"))
                        .await?;
                    self.step(Action::SubmitApiKey {
                        key: key.to_string(),
                        confirmed,
                    })
                    .await?;
                }
            }
        }
        Ok(())
    }

    /// Dispatches `action`, waits for every resulting request and prints
    /// the notices along the way.
    async fn step(&mut self, action: Action) -> Result<()> {
        let effects = self.controller.dispatch(action);
        self.print_effects(&effects).await?;
        if self.controller.state().is_loading() {
            self.term.say("Working...").await?;
        }
        let effects = self.controller.settle().await;
        self.print_effects(&effects).await
    }

    async fn print_effects(&mut self, effects: &[UiEffect]) -> Result<()> {
        for line in effects.iter().filter_map(format_effect) {
            self.term.say(&line).await?;
        }
        Ok(())
    }

    /// Prints bubbles added since the last call, or the whole transcript
    /// when it was replaced.
    async fn print_transcript(&mut self) -> Result<()> {
        let current = self.controller.state().transcript().to_vec();
        if current == self.shown {
            return Ok(());
        }
        let fresh = if current.starts_with(&self.shown) {
            &current[self.shown.len()..]
        } else {
            if !current.is_empty() {
                self.term.say("--- conversation ---").await?;
            }
            &current[..]
        };
        for bubble in fresh {
            self.term.say(&format_bubble(bubble)).await?;
        }
        self.shown = current;
        Ok(())
    }
}

/// Opens a replay for an explicit session id, bypassing the history list.
pub fn replay_action(session_id: &str, username: &str) -> Action {
    Action::LoadSession {
        session_id: SessionId::from(session_id),
        username: username.to_string(),
    }
}
