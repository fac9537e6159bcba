//! Plain-text rendering of controller projections for the terminal.

use controller::{
    Bubble, ControllerState, HistoryView, Notice, SettingsPanel, UiEffect,
    flows::history::{NO_SESSIONS, SIGN_IN_FOR_HISTORY},
};
use proto::Sender;

pub const PROMPT: &str = "flyingpig> ";

pub const API_KEY_HELP: &str = "The selected model is served by a third-party provider. \
Create a key in the provider's console and paste it here; it is stored on the server \
for your account only. Submitting an empty line cancels.";

/// Settings topics offered by `/settings`.
pub const SETTING_TOPICS: [(&str, &str); 3] = [
    ("about", "About FlyingPig"),
    ("privacy", "Privacy policy"),
    ("checkUpdate", "Check for updates"),
];

pub fn format_effect(effect: &UiEffect) -> Option<String> {
    match effect {
        UiEffect::Notify(Notice::Info(msg)) => Some(msg.clone()),
        UiEffect::Notify(Notice::Error(msg)) => Some(format!("Error: {msg}")),
        UiEffect::ClearInput(_) => None,
    }
}

pub fn format_bubble(bubble: &Bubble) -> String {
    match bubble.sender {
        Sender::User => format!("you> {}", bubble.text),
        Sender::Ai => format!("ai>\n{}", bubble.text.trim_end()),
        Sender::Other => format!("--> {}", bubble.text),
    }
}

pub fn format_history(view: &HistoryView) -> String {
    match view {
        HistoryView::Blank => String::new(),
        HistoryView::SignInRequired => SIGN_IN_FOR_HISTORY.to_string(),
        HistoryView::NoSessions => NO_SESSIONS.to_string(),
        HistoryView::Failed(msg) => msg.clone(),
        HistoryView::Entries { items, .. } => items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("[{}] {}  {}", i + 1, item.time_label, item.preview))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Model groups with the active model marked `*` and keyed models tagged.
pub fn format_models(state: &ControllerState) -> String {
    let groups = state.selector_groups();
    if groups.is_empty() {
        return "No models available.".to_string();
    }
    let selected = state.selector().displayed.as_deref();
    let mut out = Vec::new();
    for group in groups {
        out.push(format!("{}:", group.label));
        for option in group.options {
            let mark = if selected == Some(option.name.as_str()) {
                '*'
            } else {
                ' '
            };
            let tag = if option.requires_key {
                "  (API key required)"
            } else {
                ""
            };
            out.push(format!("  {mark} {}{tag}", option.name));
        }
    }
    if !state.selector().enabled {
        out.push("(model selection disabled)".to_string());
    }
    out.join("\n")
}

pub fn format_settings(panel: &SettingsPanel) -> Option<String> {
    match panel {
        SettingsPanel::Closed => None,
        SettingsPanel::Options => Some(
            SETTING_TOPICS
                .iter()
                .map(|(topic, label)| format!("  {topic:<12} {label}"))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        SettingsPanel::Loading { .. } => Some("Loading...".to_string()),
        SettingsPanel::Content { text, .. } => Some(text.clone()),
        SettingsPanel::Failed { message, .. } => Some(message.clone()),
    }
}

pub fn format_user_info(state: &ControllerState) -> Option<String> {
    let badge = state.user_badge()?;
    Some(format!("[{}] {}", badge.avatar, badge.label))
}
