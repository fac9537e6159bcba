//! Async driver around [`ControllerState`].
//!
//! Requests run as spawned tokio tasks; each completion re-enters the state
//! machine as [`Action::Completed`] through an mpsc channel, so completions
//! are applied one at a time in arrival order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::action::{Action, Command, Epoch, InputField, Notice, Request};
use crate::api::{ChatApi, perform};
use crate::state::ControllerState;

/// Effects only a UI can carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    Notify(Notice),
    ClearInput(InputField),
}

/// Owns the state, the API handle and the completion channel.
pub struct Controller {
    state: ControllerState,
    api: Arc<dyn ChatApi>,
    completions_tx: mpsc::UnboundedSender<Action>,
    completions_rx: mpsc::UnboundedReceiver<Action>,
    in_flight: usize,
}

impl Controller {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            state: ControllerState::new(),
            api,
            completions_tx,
            completions_rx,
            in_flight: 0,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Number of spawned requests whose completion has not been applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Applies `action`, spawns any requests it issued and returns the UI
    /// effects in order.
    pub fn dispatch(&mut self, action: Action) -> Vec<UiEffect> {
        let command = self.state.update(action);
        self.execute(command)
    }

    /// Waits for the next completion and applies it. Returns `None` when
    /// nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Vec<UiEffect>> {
        if self.in_flight == 0 {
            return None;
        }
        let action = self.completions_rx.recv().await?;
        self.in_flight -= 1;
        Some(self.dispatch(action))
    }

    /// Applies completions until nothing is in flight, including requests
    /// issued by the completions themselves.
    pub async fn settle(&mut self) -> Vec<UiEffect> {
        let mut effects = Vec::new();
        while let Some(more) = self.next_completion().await {
            effects.extend(more);
        }
        effects
    }

    fn execute(&mut self, command: Command) -> Vec<UiEffect> {
        let mut effects = Vec::new();
        for cmd in command.into_vec() {
            match cmd {
                Command::Request { epoch, request } => self.spawn_request(epoch, request),
                Command::Notify(notice) => effects.push(UiEffect::Notify(notice)),
                Command::ClearInput(field) => effects.push(UiEffect::ClearInput(field)),
                Command::None | Command::Batch(_) => {}
            }
        }
        effects
    }

    fn spawn_request(&mut self, epoch: Epoch, request: Request) {
        let endpoint = request.endpoint();
        trace!(endpoint, epoch, "Spawning request");
        let api = Arc::clone(&self.api);
        let tx = self.completions_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let outcome = perform(api.as_ref(), request).await;
            if tx.send(Action::Completed { epoch, outcome }).is_err() {
                debug!(endpoint, "Controller dropped before completion was delivered");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{HistoryView, Screen};
    use async_trait::async_trait;
    use proto::{
        Ack, ApiError, AuthReply, AuthStatus, Company, CredentialsBody, HistoryReply,
        LoadSessionReply, Model, ModelCatalog, SaveApiKeyBody, SelectModelBody, SelectModelReply,
        SendBody, SendReply, SessionId, SettingReply,
    };
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Scripted server. `sessions` can be held until `release` is notified.
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<&'static str>>,
        hold_sessions: bool,
        release: Notify,
    }

    impl FakeApi {
        fn record(&self, endpoint: &'static str) {
            self.calls.lock().unwrap().push(endpoint);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatApi for FakeApi {
        async fn register(&self, _body: &CredentialsBody) -> Result<Ack, ApiError> {
            self.record("register");
            Ok(Ack::ok())
        }

        async fn login(&self, body: &CredentialsBody) -> Result<AuthReply, ApiError> {
            self.record("login");
            Ok(AuthReply {
                success: true,
                username: Some(body.username.clone()),
                error: None,
            })
        }

        async fn logout(&self) -> Result<Ack, ApiError> {
            self.record("logout");
            Ok(Ack::ok())
        }

        async fn check_auth(&self) -> Result<AuthStatus, ApiError> {
            self.record("check_auth");
            Ok(AuthStatus::default())
        }

        async fn send(&self, body: &SendBody) -> Result<SendReply, ApiError> {
            self.record("send");
            Ok(SendReply {
                success: true,
                response: Some(format!("echo: {}", body.message)),
                error: None,
            })
        }

        async fn new_chat(&self) -> Result<Ack, ApiError> {
            self.record("new_chat");
            Ok(Ack::ok())
        }

        async fn sessions(&self, _user: &str) -> Result<HistoryReply, ApiError> {
            if self.hold_sessions {
                self.release.notified().await;
            }
            self.record("sessions");
            Ok(HistoryReply::Sessions(Vec::new()))
        }

        async fn load_session(
            &self,
            _session_id: &SessionId,
            _user: &str,
        ) -> Result<LoadSessionReply, ApiError> {
            self.record("load_session");
            Ok(LoadSessionReply::default())
        }

        async fn get_models(&self, _user: &str) -> Result<ModelCatalog, ApiError> {
            self.record("get_models");
            Ok(ModelCatalog::new(vec![Company {
                name: "zhipu".into(),
                models: vec![Model {
                    name: "glm-4-flash".into(),
                    requires_key: false,
                }],
            }]))
        }

        async fn select_model(
            &self,
            _body: &SelectModelBody,
        ) -> Result<SelectModelReply, ApiError> {
            self.record("select_model");
            Ok(SelectModelReply {
                success: true,
                selected_api: None,
                error: None,
            })
        }

        async fn save_api_key(&self, _body: &SaveApiKeyBody) -> Result<Ack, ApiError> {
            self.record("save_api_key");
            Ok(Ack::ok())
        }

        async fn setting(&self, _topic: &str) -> Result<SettingReply, ApiError> {
            self.record("setting");
            Ok(SettingReply::default())
        }
    }

    fn login() -> Action {
        Action::SubmitLogin {
            username: "alice".into(),
            password: "secret1".into(),
        }
    }

    #[tokio::test]
    async fn login_chains_history_and_models() {
        let api = Arc::new(FakeApi::default());
        let mut controller = Controller::new(api.clone());

        assert!(controller.dispatch(login()).is_empty());
        assert_eq!(controller.in_flight(), 1);
        let effects = controller.settle().await;

        assert!(effects.contains(&UiEffect::ClearInput(InputField::LoginForm)));
        assert_eq!(controller.in_flight(), 0);
        assert_eq!(controller.state().screen(), Screen::Main);
        assert_eq!(controller.state().history(), &HistoryView::NoSessions);
        assert!(controller.state().selector().enabled);
        let calls = api.calls();
        assert_eq!(calls[0], "login");
        assert!(calls.contains(&"sessions"));
        assert!(calls.contains(&"get_models"));
    }

    #[tokio::test]
    async fn send_round_trip_appends_reply() {
        let api = Arc::new(FakeApi::default());
        let mut controller = Controller::new(api);
        controller.dispatch(login());
        controller.settle().await;

        let effects = controller.dispatch(Action::SendMessage("hello".into()));
        assert_eq!(effects, vec![UiEffect::ClearInput(InputField::Message)]);
        assert_eq!(controller.state().transcript().len(), 1);
        controller.settle().await;
        assert_eq!(controller.state().transcript()[1].text, "echo: hello");
    }

    #[tokio::test]
    async fn completion_from_before_logout_is_discarded() {
        let api = Arc::new(FakeApi {
            hold_sessions: true,
            ..FakeApi::default()
        });
        let mut controller = Controller::new(api.clone());

        controller.dispatch(login());
        // Apply login; history stays pending, models completes.
        controller.next_completion().await;
        controller.next_completion().await;
        assert_eq!(controller.in_flight(), 1);

        controller.dispatch(Action::Logout);
        // The logout completion is the only one that can arrive.
        controller.next_completion().await;
        assert!(controller.state().username().is_none());

        api.release.notify_one();
        controller.settle().await;
        assert!(api.calls().contains(&"sessions"));
        assert_eq!(controller.state().history(), &HistoryView::Blank);
        assert!(controller.state().catalog().is_empty());
    }

    #[tokio::test]
    async fn next_completion_is_none_when_idle() {
        let mut controller = Controller::new(Arc::new(FakeApi::default()));
        assert!(controller.next_completion().await.is_none());
    }
}
