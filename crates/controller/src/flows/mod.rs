//! Transition logic, one file per feature area. Every function here is an
//! inherent method on [`ControllerState`](crate::state::ControllerState)
//! reached from `update()`.

mod api_key;
mod auth;
mod chat;
pub mod history;
mod models;
pub mod panels;

pub use chat::SIGN_IN_FIRST;
