//! reqwest-backed [`ChatApi`] talking to `<base_url>/api/<endpoint>`.

use std::time::Duration;

use async_trait::async_trait;
use proto::{
    Ack, ApiError, AuthReply, AuthStatus, CredentialsBody, HistoryReply, LoadSessionReply,
    ModelCatalog, SaveApiKeyBody, SelectModelBody, SelectModelReply, SendBody, SendReply,
    SessionId, SettingReply,
};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::ChatApi;

const BODY_PREVIEW_CHARS: usize = 200;

/// HTTP client for the chat server. Keeps a cookie store so the server's
/// session cookie is replayed on every call.
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{endpoint}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        self.execute(endpoint, self.client.get(self.url(endpoint)).query(query))
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let mut req = self.client.post(self.url(endpoint));
        if let Some(body) = body {
            req = req.json(body);
        }
        self.execute(endpoint, req).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = req
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        debug!(endpoint, status = %status.as_u16(), "Chat server responded");
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        decode_reply(status, &body)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Decodes a reply body. Failure replies usually still carry the
/// `{success, error}` shape, so the body is decoded regardless of status.
/// A body that does not fit `T` but names an `error` becomes
/// [`ApiError::Server`] on 2xx and [`ApiError::Status`] otherwise.
fn decode_reply<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    let decode_err = match serde_json::from_str::<T>(body) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    let server_error = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.trim().is_empty());
    if status.is_success() {
        if let Some(message) = server_error {
            return Err(ApiError::Server(message));
        }
        let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
        return Err(ApiError::Decode(format!("{decode_err}; body: {preview}")));
    }
    Err(ApiError::Status {
        status: status.as_u16(),
        message: server_error
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16())),
    })
}

#[async_trait]
impl ChatApi for HttpApi {
    async fn register(&self, body: &CredentialsBody) -> Result<Ack, ApiError> {
        self.post("register", Some(body)).await
    }

    async fn login(&self, body: &CredentialsBody) -> Result<AuthReply, ApiError> {
        self.post("login", Some(body)).await
    }

    async fn logout(&self) -> Result<Ack, ApiError> {
        self.post::<_, ()>("logout", None).await
    }

    async fn check_auth(&self) -> Result<AuthStatus, ApiError> {
        self.get("check_auth", &[]).await
    }

    async fn send(&self, body: &SendBody) -> Result<SendReply, ApiError> {
        self.post("send", Some(body)).await
    }

    async fn new_chat(&self) -> Result<Ack, ApiError> {
        self.post::<_, ()>("new_chat", None).await
    }

    async fn sessions(&self, user: &str) -> Result<HistoryReply, ApiError> {
        self.get("sessions", &[("user", user)]).await
    }

    async fn load_session(
        &self,
        session_id: &SessionId,
        user: &str,
    ) -> Result<LoadSessionReply, ApiError> {
        self.get(
            "load_session",
            &[("session", session_id.as_str()), ("user", user)],
        )
        .await
    }

    async fn get_models(&self, user: &str) -> Result<ModelCatalog, ApiError> {
        self.get("get_models", &[("user", user)]).await
    }

    async fn select_model(&self, body: &SelectModelBody) -> Result<SelectModelReply, ApiError> {
        self.post("select_model", Some(body)).await
    }

    async fn save_api_key(&self, body: &SaveApiKeyBody) -> Result<Ack, ApiError> {
        self.post("save_api_key", Some(body)).await
    }

    async fn setting(&self, topic: &str) -> Result<SettingReply, ApiError> {
        self.get("setting", &[("topic", topic)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpApi::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000");
        assert_eq!(api.url("login"), "http://localhost:5000/api/login");
    }

    #[test]
    fn failure_body_with_reply_shape_decodes_despite_status() {
        let reply: AuthReply = decode_reply(
            StatusCode::UNAUTHORIZED,
            r#"{"success":false,"error":"wrong password"}"#,
        )
        .unwrap();
        assert_eq!(reply.error.as_deref(), Some("wrong password"));
    }

    #[test]
    fn success_status_with_bare_error_is_server_error() {
        let err = decode_reply::<ModelCatalog>(StatusCode::OK, r#"{"error":"no models configured"}"#)
            .unwrap_err();
        assert_eq!(err, ApiError::Server("no models configured".into()));
        assert_eq!(err.user_message(), "no models configured");
    }

    #[test]
    fn error_status_surfaces_server_error_field() {
        let err = decode_reply::<ModelCatalog>(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"registry offline"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 500,
                message: "registry offline".into()
            }
        );
    }

    #[test]
    fn error_status_without_body_uses_status_code() {
        let err = decode_reply::<ModelCatalog>(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert_eq!(err.user_message(), "HTTP error! status: 502");
    }

    #[test]
    fn malformed_success_body_is_decode_error() {
        let err = decode_reply::<HistoryReply>(StatusCode::OK, r#"{"unexpected":1}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
