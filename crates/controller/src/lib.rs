//! Client session controller for the FlyingPig chat server.
//!
//! [`ControllerState::update`] is a pure transition function from
//! [`Action`] to [`Command`]; [`Controller`] drives it against a
//! [`ChatApi`] on tokio. Frontends render the read-only projections of
//! [`ControllerState`] and carry out the returned [`UiEffect`]s.

pub mod action;
pub mod api;
pub mod digest;
pub mod error;
pub mod flows;
pub mod http;
pub mod render;
pub mod runtime;
pub mod state;

/// TEA action, outcome and command types.
pub use action::{Action, Command, Epoch, InputField, KeyMode, Notice, Outcome, Request, SelectOrigin};
/// Chat server seam and request executor.
pub use api::{ChatApi, perform};
/// Form validation errors.
pub use error::{MIN_PASSWORD_LEN, ValidationError};
/// reqwest implementation of [`ChatApi`].
pub use http::HttpApi;
/// Transcript rendering.
pub use render::Bubble;
/// Async driver.
pub use runtime::{Controller, UiEffect};
/// State and projections.
pub use state::{
    ApiKeyModal, AuthForm, ControllerState, HistoryItem, HistoryView, ModelSelector, Screen,
    SelectorGroup, SelectorOption, SessionContext, SettingsPanel, UserBadge,
};
