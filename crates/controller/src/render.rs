//! Rendering projections: transcript bubbles and history row labels.
//!
//! User-authored text is always escaped; only assistant replies pass
//! through the markdown renderer and may contain markup.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use proto::Sender;
use pulldown_cmark::{Options, Parser, html};
use serde_json::Value;

/// Label for history rows whose timestamp is missing or unparseable.
pub const UNKNOWN_TIME: &str = "Unknown time";
/// Label for history rows without preview text.
pub const NO_PREVIEW: &str = "No preview";

const TIME_FORMAT: &str = "%Y/%m/%d %H:%M";

/// One rendered transcript message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub sender: Sender,
    /// Original text as sent or received.
    pub text: String,
    /// HTML body safe to insert into the page.
    pub html: String,
}

impl Bubble {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        let text = text.into();
        let html = if sender.is_trusted_markup() {
            markdown_to_html(&text)
        } else {
            escape_html(&text)
        };
        Self { sender, text, html }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Sender::Ai, text)
    }
}

/// Converts assistant markdown to HTML.
pub fn markdown_to_html(md: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(md, opts);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Escapes text so it is displayed literally, never interpreted as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String cannot fail.
    let _ = pulldown_cmark_escape::escape_html(&mut out, text);
    out
}

/// Formats a history `last_time` value as a short local date-time.
///
/// Numbers are epoch milliseconds; strings may be RFC 3339 or a naive
/// `YYYY-MM-DD HH:MM:SS` local time. Anything else yields [`UNKNOWN_TIME`].
pub fn format_last_time(value: Option<&Value>) -> String {
    parse_last_time(value)
        .map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN_TIME.to_string())
}

fn parse_last_time(value: Option<&Value>) -> Option<DateTime<Local>> {
    match value? {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis).map(|t| t.with_timezone(&Local))
        }
        Value::String(s) => parse_time_str(s.trim()),
        _ => None,
    }
}

fn parse_time_str(s: &str) -> Option<DateTime<Local>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Local));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }
    None
}

/// Preview text for a history row, falling back to [`NO_PREVIEW`].
pub fn preview_text(preview: Option<&str>) -> String {
    match preview.map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => NO_PREVIEW.to_string(),
    }
}
