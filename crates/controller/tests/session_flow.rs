use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use controller::{
    Action, ApiKeyModal, AuthForm, Controller, HistoryView, HttpApi, InputField, Notice, Screen,
    SettingsPanel, UiEffect,
};
use proto::Sender;
use serde::Deserialize;
use serde_json::{Value, json};

const SECRET1_DIGEST: &str = "5b11618c2e44027877d0cd0921ed166b9f176f50587fc91e7534dd2946db77d6";
const COOKIE: &str = "fp_session";

// ── Mock chat server ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Server {
    /// username -> password digest
    users: HashMap<String, String>,
    /// (username, model) -> api key
    keys: HashMap<(String, String), String>,
    selected: HashMap<String, String>,
    calls: Vec<String>,
}

type Shared = Arc<Mutex<Server>>;

fn session_user(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

fn record(state: &Shared, endpoint: &str) {
    state.lock().unwrap().calls.push(endpoint.to_string());
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

async fn register(State(state): State<Shared>, Json(body): Json<Credentials>) -> Json<Value> {
    record(&state, "register");
    let mut server = state.lock().unwrap();
    if server.users.contains_key(&body.username) {
        return Json(json!({"success": false, "error": "Username already exists"}));
    }
    server.users.insert(body.username, body.password);
    Json(json!({"success": true}))
}

async fn login(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    record(&state, "login");
    let ok = state.lock().unwrap().users.get(&body.username) == Some(&body.password);
    if !ok {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "Invalid username or password"})),
        )
            .into_response();
    }
    (
        [(header::SET_COOKIE, format!("{COOKIE}={}; Path=/", body.username))],
        Json(json!({"success": true, "username": body.username})),
    )
        .into_response()
}

async fn logout(State(state): State<Shared>) -> Response {
    record(&state, "logout");
    (
        [(header::SET_COOKIE, format!("{COOKIE}=; Path=/; Max-Age=0"))],
        Json(json!({"success": true})),
    )
        .into_response()
}

async fn check_auth(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, "check_auth");
    match session_user(&headers) {
        Some(user) => Json(json!({"isLoggedIn": true, "username": user})),
        None => Json(json!({"isLoggedIn": false})),
    }
}

#[derive(Deserialize)]
struct SendIn {
    message: String,
    username: String,
}

async fn send(State(state): State<Shared>, Json(body): Json<SendIn>) -> Json<Value> {
    record(&state, "send");
    Json(json!({
        "success": true,
        "response": format!("**Hi** {}, you said _{}_", body.username, body.message),
    }))
}

async fn new_chat(State(state): State<Shared>) -> Json<Value> {
    record(&state, "new_chat");
    Json(json!({"success": true}))
}

async fn sessions(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, "sessions");
    if session_user(&headers).is_none() {
        return Json(json!({"error": "Not logged in"}));
    }
    Json(json!([
        ["s1", {"last_time": "2024-05-01T10:30:00+00:00", "preview": "hello there"}],
        ["s2", {"last_time": null}],
    ]))
}

async fn load_session(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    record(&state, "load_session");
    match params.get("session").map(String::as_str) {
        Some("s1") => Json(json!({
            "success": true,
            "messages": [
                {"text": "<b>hi</b>", "sender": "user"},
                {"text": "# Answer", "sender": "ai"},
            ],
        })),
        _ => Json(json!({"success": false, "error": "Session not found"})),
    }
}

async fn get_models(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&state, "get_models");
    let user = params.get("user").cloned().unwrap_or_default();
    if user == "broken" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "model registry offline"})),
        )
            .into_response();
    }
    let server = state.lock().unwrap();
    let has_key = server
        .keys
        .contains_key(&(user, "deepseek-chat".to_string()));
    Json(json!([
        {"company": "zhipu", "models": [{"name": "glm-4-flash", "requires_key": false}]},
        {"company": "deepseek", "models": [{"name": "deepseek-chat", "requires_key": !has_key}]},
    ]))
    .into_response()
}

#[derive(Deserialize)]
struct SelectIn {
    username: String,
    model_name: String,
}

async fn select_model(State(state): State<Shared>, Json(body): Json<SelectIn>) -> Json<Value> {
    record(&state, "select_model");
    state
        .lock()
        .unwrap()
        .selected
        .insert(body.username, body.model_name);
    Json(json!({"success": true, "selected_api": "zhipuai"}))
}

#[derive(Deserialize)]
struct KeyIn {
    username: String,
    model_name: String,
    api_key: String,
}

async fn save_api_key(State(state): State<Shared>, Json(body): Json<KeyIn>) -> Json<Value> {
    record(&state, "save_api_key");
    let mut server = state.lock().unwrap();
    let slot = (body.username, body.model_name);
    if body.api_key.is_empty() {
        server.keys.remove(&slot);
    } else {
        server.keys.insert(slot, body.api_key);
    }
    Json(json!({"success": true}))
}

async fn setting(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    record(&state, "setting");
    let topic = params.get("topic").cloned().unwrap_or_default();
    Json(json!({"success": true, "messages": format!("Content for {topic}")}))
}

async fn spawn_server() -> (String, Shared) {
    let state: Shared = Arc::default();
    let app = Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/check_auth", get(check_auth))
        .route("/api/send", post(send))
        .route("/api/new_chat", post(new_chat))
        .route("/api/sessions", get(sessions))
        .route("/api/load_session", get(load_session))
        .route("/api/get_models", get(get_models))
        .route("/api/select_model", post(select_model))
        .route("/api/save_api_key", post(save_api_key))
        .route("/api/setting", get(setting))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    (format!("http://{addr}"), state)
}

fn http_api(base_url: &str) -> Arc<HttpApi> {
    Arc::new(HttpApi::new(base_url, Duration::from_secs(5)).expect("http client"))
}

async fn signed_in_controller(api: Arc<HttpApi>, state: &Shared) -> Controller {
    state
        .lock()
        .unwrap()
        .users
        .insert("alice".into(), SECRET1_DIGEST.into());
    let mut controller = Controller::new(api);
    controller.dispatch(Action::SubmitLogin {
        username: "alice".into(),
        password: "secret1".into(),
    });
    controller.settle().await;
    assert_eq!(controller.state().username(), Some("alice"));
    controller
}

fn calls(state: &Shared) -> Vec<String> {
    state.lock().unwrap().calls.clone()
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_login_then_save_key_for_keyed_model() {
    let (base, state) = spawn_server().await;
    let mut controller = Controller::new(http_api(&base));

    controller.dispatch(Action::ToggleAuthForms);
    controller.dispatch(Action::SubmitRegister {
        username: "alice".into(),
        password: "secret1".into(),
        confirm: "secret1".into(),
    });
    let effects = controller.settle().await;
    assert!(effects.contains(&UiEffect::Notify(Notice::Info(
        "Registration successful, please log in.".into()
    ))));
    assert!(effects.contains(&UiEffect::ClearInput(InputField::RegisterForm)));
    assert_eq!(controller.state().screen(), Screen::Auth(AuthForm::Login));
    assert!(controller.state().username().is_none());
    assert_eq!(
        state.lock().unwrap().users.get("alice").map(String::as_str),
        Some(SECRET1_DIGEST)
    );

    controller.dispatch(Action::SubmitLogin {
        username: "alice".into(),
        password: "secret1".into(),
    });
    controller.settle().await;
    assert_eq!(controller.state().screen(), Screen::Main);
    assert!(controller.state().selector().enabled);
    assert_eq!(controller.state().selector_groups().len(), 2);
    match controller.state().history() {
        HistoryView::Entries { owner, items } => {
            assert_eq!(owner, "alice");
            assert_eq!(items.len(), 2);
            assert_eq!(items[1].preview, "No preview");
            assert_eq!(items[1].time_label, "Unknown time");
        }
        other => panic!("unexpected history {other:?}"),
    }

    let before = calls(&state).len();
    controller.dispatch(Action::SelectModel("deepseek-chat".into()));
    assert_eq!(controller.in_flight(), 0);
    assert_eq!(
        controller.state().api_key_modal().target(),
        Some("deepseek-chat")
    );

    controller.dispatch(Action::SubmitApiKey {
        key: "sk-123".into(),
        confirmed: true,
    });
    assert!(controller.state().is_loading());
    assert_eq!(controller.state().api_key_modal(), &ApiKeyModal::Closed);
    controller.settle().await;

    assert!(!controller.state().is_loading());
    assert_eq!(
        controller.state().selector().committed.as_deref(),
        Some("deepseek-chat")
    );
    let model = controller.state().catalog().find("deepseek-chat").unwrap();
    assert!(!model.requires_key);
    assert_eq!(calls(&state)[before..], ["save_api_key".to_string()]);
    assert_eq!(
        state
            .lock()
            .unwrap()
            .keys
            .get(&("alice".to_string(), "deepseek-chat".to_string()))
            .map(String::as_str),
        Some("sk-123")
    );
}

#[tokio::test]
async fn wrong_password_shows_server_error_inline() {
    let (base, state) = spawn_server().await;
    state
        .lock()
        .unwrap()
        .users
        .insert("alice".into(), SECRET1_DIGEST.into());
    let mut controller = Controller::new(http_api(&base));

    controller.dispatch(Action::SubmitLogin {
        username: "alice".into(),
        password: "not-it".into(),
    });
    controller.settle().await;
    assert_eq!(
        controller.state().login_error(),
        Some("Invalid username or password")
    );
    assert!(controller.state().username().is_none());
    assert!(!calls(&state).contains(&"sessions".to_string()));
}

#[tokio::test]
async fn send_renders_reply_as_markdown_and_echo_as_text() {
    let (base, state) = spawn_server().await;
    let mut controller = signed_in_controller(http_api(&base), &state).await;

    let effects = controller.dispatch(Action::SendMessage("hello".into()));
    assert_eq!(effects, vec![UiEffect::ClearInput(InputField::Message)]);
    controller.settle().await;

    let transcript = controller.state().transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].sender, Sender::User);
    assert_eq!(transcript[0].html, "hello");
    assert_eq!(transcript[1].sender, Sender::Ai);
    assert!(transcript[1].html.contains("<strong>Hi</strong>"));
    assert!(transcript[1].html.contains("<em>hello</em>"));
}

#[tokio::test]
async fn restore_session_reuses_cookie_and_auto_selects_first_model() {
    let (base, state) = spawn_server().await;
    let api = http_api(&base);
    signed_in_controller(api.clone(), &state).await;

    // A fresh controller over the same client sees the server session.
    let mut restored = Controller::new(api);
    restored.dispatch(Action::RestoreSession);
    restored.settle().await;

    assert_eq!(restored.state().username(), Some("alice"));
    assert_eq!(
        restored.state().selector().committed.as_deref(),
        Some("glm-4-flash")
    );
    assert_eq!(restored.state().api_key_modal(), &ApiKeyModal::Closed);
    assert_eq!(
        state.lock().unwrap().selected.get("alice").map(String::as_str),
        Some("glm-4-flash")
    );
}

#[tokio::test]
async fn restore_without_cookie_stays_signed_out() {
    let (base, _state) = spawn_server().await;
    let mut controller = Controller::new(http_api(&base));
    controller.dispatch(Action::RestoreSession);
    controller.settle().await;
    assert_eq!(controller.state().screen(), Screen::Auth(AuthForm::Login));
    assert!(!controller.state().selector().enabled);
}

#[tokio::test]
async fn logout_clears_local_state_and_server_session() {
    let (base, state) = spawn_server().await;
    let api = http_api(&base);
    let mut controller = signed_in_controller(api.clone(), &state).await;
    controller.dispatch(Action::SendMessage("hello".into()));
    controller.settle().await;

    controller.dispatch(Action::Logout);
    controller.settle().await;
    assert!(controller.state().username().is_none());
    assert!(controller.state().transcript().is_empty());
    assert!(controller.state().catalog().is_empty());
    assert!(!controller.state().selector().enabled);
    assert_eq!(controller.state().screen(), Screen::Auth(AuthForm::Login));

    let mut fresh = Controller::new(api);
    fresh.dispatch(Action::RestoreSession);
    fresh.settle().await;
    assert!(fresh.state().username().is_none());
}

#[tokio::test]
async fn history_entry_replays_stored_session() {
    let (base, state) = spawn_server().await;
    let mut controller = signed_in_controller(http_api(&base), &state).await;
    controller.dispatch(Action::ToggleSidebar);
    assert!(controller.state().is_sidebar_open());

    let open = controller.state().history().open_action(0).unwrap();
    controller.dispatch(open);
    controller.settle().await;

    let transcript = controller.state().transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].html, "&lt;b&gt;hi&lt;/b&gt;");
    assert!(transcript[1].html.contains("<h1>Answer</h1>"));
    assert!(!controller.state().is_sidebar_open());
}

#[tokio::test]
async fn model_load_failure_disables_selector() {
    let (base, state) = spawn_server().await;
    state
        .lock()
        .unwrap()
        .users
        .insert("broken".into(), SECRET1_DIGEST.into());
    let mut controller = Controller::new(http_api(&base));
    controller.dispatch(Action::SubmitLogin {
        username: "broken".into(),
        password: "secret1".into(),
    });
    let effects = controller.settle().await;

    assert!(effects.contains(&UiEffect::Notify(Notice::Error(
        "Failed to load model list: model registry offline".into()
    ))));
    assert!(!controller.state().selector().enabled);
    assert!(controller.state().selector_groups().is_empty());
}

#[tokio::test]
async fn settings_topics_load_from_server_except_check_update() {
    let (base, state) = spawn_server().await;
    let mut controller = signed_in_controller(http_api(&base), &state).await;

    controller.dispatch(Action::OpenSettings);
    controller.dispatch(Action::ChooseSetting("checkUpdate".into()));
    assert_eq!(controller.in_flight(), 0);

    controller.dispatch(Action::BackToSettings);
    controller.dispatch(Action::ChooseSetting("about".into()));
    controller.settle().await;
    assert_eq!(
        controller.state().settings(),
        &SettingsPanel::Content {
            topic: "about".into(),
            text: "Content for about".into()
        }
    );
    assert_eq!(
        calls(&state)
            .iter()
            .filter(|c| c.as_str() == "setting")
            .count(),
        1
    );
}
