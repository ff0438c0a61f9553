//! Frame renderer for the interactive browser
//!
//! Draws the key strip, the entry list with focus and selection markers, and
//! a status footer inside an ASCII box sized to the terminal.

use crate::output::TIMESTAMP_FORMAT;
use colored::*;
use litelog_core::timezone::TimezoneConfig;
use litelog_core::types::{KeyToken, LogEntry, TimeWindow, VirtualKey};
use std::fmt;

/// Box drawing characters for UI (ASCII)
const BOX_CORNER: &str = "+";
const BOX_HORIZONTAL: &str = "-";
const BOX_VERTICAL: &str = "|";

const FOCUS_MARKER: &str = ">";
const SELECTED_MARKER: &str = "*";

/// Rows taken by the box, title, key strip, separators and footer
const CHROME_ROWS: usize = 10;

const HELP: &str = "j/k move  enter select  o older  r latest  R refresh  n/p key  f payload  e dismiss  q quit";

/// Everything one frame shows
#[derive(Debug, Default)]
pub struct BrowserFrame<'a> {
    pub keys: &'a [VirtualKey],
    pub selected_key: Option<&'a KeyToken>,
    pub entries: &'a [LogEntry],
    pub window: Option<TimeWindow>,
    pub focused: Option<&'a str>,
    pub selected_entry: Option<&'a str>,
    pub is_loading_keys: bool,
    pub is_loading_logs: bool,
    pub is_paginating: bool,
    pub error: Option<&'a str>,
}

/// Renders [`BrowserFrame`]s at a fixed width
pub struct BrowserView {
    width: usize,
    max_rows: usize,
    timezone: TimezoneConfig,
    /// Whether to use colored output (respects NO_COLOR environment variable)
    colored_output: bool,
}

impl BrowserView {
    /// Create a view sized to the current terminal
    pub fn new(timezone: TimezoneConfig) -> Self {
        let (raw_width, raw_height) = terminal_dimensions().unwrap_or((100, 30));
        let width = if raw_width < 60 {
            raw_width.max(20)
        } else {
            raw_width.clamp(60, 140)
        };
        Self {
            width,
            max_rows: raw_height.saturating_sub(CHROME_ROWS).max(5),
            timezone,
            colored_output: std::env::var("NO_COLOR").is_err(),
        }
    }

    /// Create a view with explicit dimensions and no color
    pub fn with_size(timezone: TimezoneConfig, width: usize, max_rows: usize) -> Self {
        Self {
            width: width.max(20),
            max_rows: max_rows.max(1),
            timezone,
            colored_output: false,
        }
    }

    /// Render a complete frame
    pub fn render(&self, frame: &BrowserFrame<'_>) -> String {
        let mut output = String::new();

        output.push_str(&self.draw_border());
        output.push_str(&self.draw_line(&self.title(frame)));
        output.push_str(&self.draw_line(&self.key_strip(frame)));
        output.push_str(&self.draw_border());

        if frame.selected_key.is_none() {
            output.push_str(&self.draw_line("Select a key to view its logs."));
        } else if frame.entries.is_empty() {
            let message = if frame.is_loading_logs {
                "Loading logs..."
            } else {
                "No logs in this window."
            };
            output.push_str(&self.draw_line(message));
        } else {
            for line in self.entry_lines(frame) {
                output.push_str(&self.draw_line(&line));
            }
        }

        output.push_str(&self.draw_border());
        output.push_str(&self.draw_line(&self.status_line(frame)));
        if let Some(error) = frame.error {
            let error = format!("Error: {error}");
            let error = if self.colored_output {
                error.red().to_string()
            } else {
                error
            };
            output.push_str(&self.draw_line(&error));
        }
        output.push_str(&self.draw_line(HELP));
        output.push_str(&self.draw_border());
        output
    }

    fn title(&self, frame: &BrowserFrame<'_>) -> String {
        let key = frame
            .selected_key
            .and_then(|token| frame.keys.iter().find(|k| &k.token == token))
            .map(|k| k.display_name().to_string())
            .unwrap_or_else(|| "no key selected".to_string());
        let title = format!("LITELOG - {key}");
        if self.colored_output {
            title.bold().to_string()
        } else {
            title
        }
    }

    fn key_strip(&self, frame: &BrowserFrame<'_>) -> String {
        if frame.is_loading_keys {
            return "Loading keys...".to_string();
        }
        if frame.keys.is_empty() {
            return "No virtual keys found.".to_string();
        }
        frame
            .keys
            .iter()
            .map(|key| {
                if frame.selected_key == Some(&key.token) {
                    format!("[{}]", key.display_name())
                } else {
                    key.display_name().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    }

    /// Rows around the focused entry, at most `max_rows` of them
    fn entry_lines(&self, frame: &BrowserFrame<'_>) -> Vec<String> {
        let focus_index = frame
            .focused
            .and_then(|id| frame.entries.iter().position(|e| e.request_id == id));
        let range = visible_range(frame.entries.len(), focus_index, self.max_rows);

        let mut lines: Vec<String> = frame.entries[range.clone()]
            .iter()
            .map(|entry| self.entry_line(entry, frame))
            .collect();

        let hidden_above = range.start;
        let hidden_below = frame.entries.len() - range.end;
        if hidden_above > 0 {
            lines.insert(0, format!("  ... {hidden_above} newer"));
        }
        if hidden_below > 0 {
            lines.push(format!("  ... {hidden_below} older"));
        }
        lines
    }

    fn entry_line(&self, entry: &LogEntry, frame: &BrowserFrame<'_>) -> String {
        let focus = if frame.focused == Some(entry.request_id.as_str()) {
            FOCUS_MARKER
        } else {
            " "
        };
        let selected = if frame.selected_entry == Some(entry.request_id.as_str()) {
            SELECTED_MARKER
        } else {
            " "
        };
        let status = if entry.is_success() { "OK " } else { "ERR" };
        let status = match (self.colored_output, entry.is_success()) {
            (false, _) => status.to_string(),
            (true, true) => status.green().to_string(),
            (true, false) => status.red().to_string(),
        };
        let start = entry
            .started_at()
            .map(|dt| self.timezone.format(&dt, TIMESTAMP_FORMAT))
            .unwrap_or_else(|| entry.start_time.clone());
        let duration = entry
            .duration_secs()
            .map(|s| format!("{s:.3}s"))
            .unwrap_or_else(|| "-".to_string());
        let tokens = entry
            .total_tokens
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{focus}{selected} {status} {start}  {duration:>8}  ${:.6}  {tokens:>7}  {}",
            entry.spend, entry.model
        )
    }

    fn status_line(&self, frame: &BrowserFrame<'_>) -> String {
        let mut parts = Vec::new();
        if frame.selected_key.is_some() {
            parts.push(format!("{} entries", frame.entries.len()));
        }
        if let Some(window) = frame.window {
            parts.push(format!(
                "since {} ({})",
                self.timezone.format(&window.start, TIMESTAMP_FORMAT),
                self.timezone.display_name()
            ));
        }
        if frame.is_loading_logs {
            parts.push("loading...".to_string());
        }
        if frame.is_paginating {
            parts.push("loading older...".to_string());
        }
        if parts.is_empty() {
            "Ready".to_string()
        } else {
            parts.join("  ")
        }
    }

    fn draw_border(&self) -> String {
        format!(
            "{}{}{}\n",
            BOX_CORNER,
            BOX_HORIZONTAL.repeat(self.width - 2),
            BOX_CORNER
        )
    }

    /// Draw a left-aligned line with padding
    fn draw_line(&self, content: &str) -> String {
        let available_width = self.width.saturating_sub(4);
        let truncated_content = console::truncate_str(content, available_width, "...");
        let padding = available_width.saturating_sub(console::measure_text_width(&truncated_content));
        format!(
            "{} {}{} {}\n",
            BOX_VERTICAL,
            truncated_content,
            " ".repeat(padding),
            BOX_VERTICAL
        )
    }
}

/// Slice of `len` rows of height `capacity` that keeps `focus` visible.
///
/// Without focus the newest rows (the top of the list) are shown.
fn visible_range(len: usize, focus: Option<usize>, capacity: usize) -> std::ops::Range<usize> {
    if len <= capacity {
        return 0..len;
    }
    let focus = focus.unwrap_or(0);
    let start = focus
        .saturating_sub(capacity / 2)
        .min(len - capacity);
    start..start + capacity
}

fn terminal_dimensions() -> Option<(usize, usize)> {
    terminal_size::terminal_size().map(|(width, height)| (width.0 as usize, height.0 as usize))
}

impl fmt::Display for BrowserView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BrowserView(width: {})", self.width)
    }
}
