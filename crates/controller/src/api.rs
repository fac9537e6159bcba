//! The chat server seam: one async method per endpoint.

use async_trait::async_trait;
use proto::{
    Ack, ApiError, AuthReply, AuthStatus, CredentialsBody, HistoryReply, LoadSessionReply,
    ModelCatalog, SaveApiKeyBody, SelectModelBody, SelectModelReply, SendBody, SendReply,
    SessionId, SettingReply,
};

use crate::action::{Outcome, Request};

/// Chat server endpoints. [`HttpApi`](crate::http::HttpApi) is the real
/// implementation; tests substitute scripted ones.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn register(&self, body: &CredentialsBody) -> Result<Ack, ApiError>;
    async fn login(&self, body: &CredentialsBody) -> Result<AuthReply, ApiError>;
    async fn logout(&self) -> Result<Ack, ApiError>;
    async fn check_auth(&self) -> Result<AuthStatus, ApiError>;
    async fn send(&self, body: &SendBody) -> Result<SendReply, ApiError>;
    async fn new_chat(&self) -> Result<Ack, ApiError>;
    async fn sessions(&self, user: &str) -> Result<HistoryReply, ApiError>;
    async fn load_session(
        &self,
        session_id: &SessionId,
        user: &str,
    ) -> Result<LoadSessionReply, ApiError>;
    async fn get_models(&self, user: &str) -> Result<ModelCatalog, ApiError>;
    async fn select_model(&self, body: &SelectModelBody) -> Result<SelectModelReply, ApiError>;
    /// An empty `api_key` clears the stored key.
    async fn save_api_key(&self, body: &SaveApiKeyBody) -> Result<Ack, ApiError>;
    async fn setting(&self, topic: &str) -> Result<SettingReply, ApiError>;
}

/// Executes `request` against `api` and tags the result with the context
/// its transition needs.
pub async fn perform(api: &dyn ChatApi, request: Request) -> Outcome {
    match request {
        Request::Register(body) => Outcome::Registered(api.register(&body).await),
        Request::Login(body) => Outcome::LoggedIn(api.login(&body).await),
        Request::Logout => Outcome::LoggedOut(api.logout().await),
        Request::CheckAuth => Outcome::AuthChecked(api.check_auth().await),
        Request::Send(body) => Outcome::MessageSent(api.send(&body).await),
        Request::NewChat => Outcome::ChatCreated(api.new_chat().await),
        Request::Sessions { user } => Outcome::HistoryLoaded(api.sessions(&user).await),
        Request::LoadSession { session_id, user } => {
            let result = api.load_session(&session_id, &user).await;
            Outcome::SessionLoaded { session_id, result }
        }
        Request::GetModels { user, auto_select } => Outcome::ModelsLoaded {
            auto_select,
            result: api.get_models(&user).await,
        },
        Request::SelectModel { body, origin } => {
            let result = api.select_model(&body).await;
            Outcome::ModelSelected {
                model: body.model_name,
                origin,
                result,
            }
        }
        Request::SaveApiKey { body, mode } => {
            let result = api.save_api_key(&body).await;
            Outcome::ApiKeySaved {
                model: body.model_name,
                mode,
                result,
            }
        }
        Request::Setting { topic } => {
            let result = api.setting(&topic).await;
            Outcome::SettingLoaded { topic, result }
        }
    }
}
