//! Pretty-printing of request and response payloads

use litelog_core::types::Payload;

/// Placeholder shown for a missing payload
pub const NO_PAYLOAD: &str = "(none)";

/// Payloads above this size are not decoded at all
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Rendered payloads are cut after this many characters
pub const MAX_DISPLAY_CHARS: usize = 50_000;

/// How the detail view shows request and response payloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadView {
    /// Indented JSON of both payloads
    #[default]
    Raw,
    /// Chat messages, tool calls and tool definitions
    Formatted,
}

impl PayloadView {
    /// The other view
    pub fn toggled(self) -> Self {
        match self {
            Self::Raw => Self::Formatted,
            Self::Formatted => Self::Raw,
        }
    }
}

/// Render a payload as indented JSON.
///
/// Bytes that are not valid JSON are shown as (lossy) UTF-8 text. Oversized
/// payloads are replaced by a notice and long output is truncated.
pub fn pretty_payload(payload: Option<&Payload>) -> String {
    let Some(payload) = payload else {
        return NO_PAYLOAD.to_string();
    };
    if let Some(notice) = too_large(payload) {
        return notice;
    }

    let text = serde_json::from_slice::<serde_json::Value>(payload.as_bytes())
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(payload.as_bytes()).into_owned());
    truncate_display(text)
}

/// Notice for a payload over [`MAX_PAYLOAD_BYTES`]
pub(crate) fn too_large(payload: &Payload) -> Option<String> {
    (payload.len() > MAX_PAYLOAD_BYTES).then(|| {
        format!(
            "Payload too large ({}). Use --json to get the full content.",
            format_bytes(payload.len())
        )
    })
}

pub(crate) fn truncate_display(text: String) -> String {
    match text.char_indices().nth(MAX_DISPLAY_CHARS) {
        Some((cut, _)) => format!("{}\n\n... (truncated)", &text[..cut]),
        None => text,
    }
}

fn format_bytes(bytes: usize) -> String {
    if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    } else {
        format!("{:.0} KB", bytes as f64 / 1_000.0)
    }
}
