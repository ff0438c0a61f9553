//! Output formatting module for litelog
//!
//! This module provides formatters for displaying keys and request logs in
//! different formats:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output and integration with other tools
//!
//! # Examples
//!
//! ```no_run
//! use litelog_core::timezone::TimezoneConfig;
//! use litelog_terminal::output::get_formatter;
//!
//! let formatter = get_formatter(false, TimezoneConfig::utc());
//! println!("{}", formatter.format_logs(&[], None));
//!
//! let json_formatter = get_formatter(true, TimezoneConfig::utc());
//! println!("{}", json_formatter.format_keys(&[], None));
//! ```

use crate::conversation::format_conversation;
use crate::payload::{PayloadView, pretty_payload};
use chrono::{DateTime, Utc};
use litelog_core::timezone::TimezoneConfig;
use litelog_core::types::{KeyToken, LogEntry, TimeWindow, VirtualKey};
use prettytable::{Cell, Row, Table, format, row};
use serde_json::json;

/// Timestamp format used in tables and the detail view
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Trait for output formatters
///
/// Implementations render the three views the CLI prints: the key list, a
/// windowed entry list, and the detail of a single entry.
pub trait OutputFormatter {
    /// Format the virtual key list, marking `selected` if given
    fn format_keys(&self, keys: &[VirtualKey], selected: Option<&KeyToken>) -> String;

    /// Format the merged entry list of one key together with its window
    fn format_logs(&self, entries: &[LogEntry], window: Option<&TimeWindow>) -> String;

    /// Format every field of one entry including its payloads, shown as
    /// `view` where the format has a choice
    fn format_log_detail(&self, entry: &LogEntry, view: PayloadView) -> String;
}

/// Table formatter for human-readable output
///
/// Timestamps are rendered in the configured timezone. Costs keep the
/// precision the gateway reports, since single requests are often fractions
/// of a cent.
pub struct TableFormatter {
    timezone: TimezoneConfig,
}

impl TableFormatter {
    /// Create a new TableFormatter
    pub fn new(timezone: TimezoneConfig) -> Self {
        Self { timezone }
    }

    /// Format a number with thousands separators
    pub(crate) fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    /// Spend as shown in list rows
    pub(crate) fn format_spend(amount: f64) -> String {
        format!("${amount:.6}")
    }

    /// Duration as shown in list rows
    pub(crate) fn format_duration(secs: Option<f64>) -> String {
        secs.map(|s| format!("{s:.3}s"))
            .unwrap_or_else(|| "-".to_string())
    }

    fn format_tokens(tokens: Option<u64>) -> String {
        tokens
            .map(Self::format_number)
            .unwrap_or_else(|| "-".to_string())
    }

    fn format_instant(&self, dt: &DateTime<Utc>) -> String {
        self.timezone.format(dt, TIMESTAMP_FORMAT)
    }

    /// Parsed timestamp in the configured timezone, or the raw string
    fn format_timestamp(&self, parsed: Option<DateTime<Utc>>, raw: &str) -> String {
        parsed
            .map(|dt| self.format_instant(&dt))
            .unwrap_or_else(|| raw.to_string())
    }

    fn status_cell(entry: &LogEntry) -> Cell {
        if entry.is_success() {
            Cell::new("OK").style_spec("Fg")
        } else {
            let label = if entry.status.is_empty() {
                "ERR"
            } else {
                entry.status.as_str()
            };
            Cell::new(label).style_spec("Fr")
        }
    }
}

impl OutputFormatter for TableFormatter {
    fn format_keys(&self, keys: &[VirtualKey], selected: Option<&KeyToken>) -> String {
        if keys.is_empty() {
            return "No virtual keys found.\n".to_string();
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> "",
            b -> "Name",
            b -> "Key",
            b -> "Spend",
            b -> "Created"
        ]);

        for key in keys {
            let marker = if selected == Some(&key.token) { "*" } else { "" };
            table.add_row(row![
                marker,
                key.display_name(),
                key.key_name,
                r -> format!("${:.4}", key.spend),
                key.created_at
            ]);
        }

        table.to_string()
    }

    fn format_logs(&self, entries: &[LogEntry], window: Option<&TimeWindow>) -> String {
        let mut output = String::new();

        if entries.is_empty() {
            output.push_str("No logs in this window.\n");
        } else {
            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
            table.set_titles(row![
                b -> "Status",
                b -> "Model",
                b -> "Start",
                b -> "Duration",
                b -> "Spend",
                b -> "Tokens",
                b -> "Request ID"
            ]);

            for entry in entries {
                table.add_row(Row::new(vec![
                    Self::status_cell(entry),
                    Cell::new(&entry.model),
                    Cell::new(&self.format_timestamp(entry.started_at(), &entry.start_time)),
                    Cell::new(&Self::format_duration(entry.duration_secs())).style_spec("r"),
                    Cell::new(&Self::format_spend(entry.spend)).style_spec("r"),
                    Cell::new(&Self::format_tokens(entry.total_tokens)).style_spec("r"),
                    Cell::new(&entry.request_id),
                ]));
            }
            output.push_str(&table.to_string());
        }

        if let Some(window) = window {
            output.push_str(&format!(
                "\n{} entries from {} to {} ({})\n",
                entries.len(),
                self.format_instant(&window.start),
                self.format_instant(&window.end),
                self.timezone.display_name()
            ));
        }
        output
    }

    fn format_log_detail(&self, entry: &LogEntry, view: PayloadView) -> String {
        let or_dash = |value: Option<&str>| value.unwrap_or("-").to_string();
        let tokens = match (entry.total_tokens, entry.prompt_tokens, entry.completion_tokens) {
            (None, None, None) => "-".to_string(),
            (total, prompt, completion) => format!(
                "{} (prompt {}, completion {})",
                Self::format_tokens(total),
                Self::format_tokens(prompt),
                Self::format_tokens(completion)
            ),
        };

        let fields = [
            ("Status", entry.status.clone()),
            ("Spend", format!("${:.8} USD", entry.spend)),
            ("Model", entry.model.clone()),
            ("Request ID", entry.request_id.clone()),
            (
                "Start",
                self.format_timestamp(entry.started_at(), &entry.start_time),
            ),
            (
                "End",
                self.format_timestamp(entry.ended_at(), &entry.end_time),
            ),
            ("Duration", Self::format_duration(entry.duration_secs())),
            ("Tokens", tokens),
            ("User", or_dash(entry.user.as_deref())),
            ("Cache hit", or_dash(entry.cache_hit.as_deref())),
            ("Provider", or_dash(entry.custom_llm_provider.as_deref())),
            ("API base", or_dash(entry.api_base_origin().as_deref())),
        ];

        let mut output = String::new();
        for (label, value) in fields {
            output.push_str(&format!("{:<12} {}\n", format!("{label}:"), value));
        }
        match view {
            PayloadView::Raw => {
                output.push_str("\nRequest:\n");
                output.push_str(&pretty_payload(entry.request_payload.as_ref()));
                output.push_str("\n\nResponse:\n");
                output.push_str(&pretty_payload(entry.response_payload.as_ref()));
            }
            PayloadView::Formatted => {
                output.push('\n');
                output.push_str(&format_conversation(
                    entry.request_payload.as_ref(),
                    entry.response_payload.as_ref(),
                ));
            }
        }
        output.push('\n');
        output
    }
}

/// JSON formatter for machine-readable output
///
/// Entries are serialized with their wire field names so the output can be
/// fed back into other gateway tooling. Payloads are always emitted whole.
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_keys(&self, keys: &[VirtualKey], selected: Option<&KeyToken>) -> String {
        let output = json!({
            "keys": keys,
            "selected": selected,
        });
        serde_json::to_string_pretty(&output).unwrap_or_default()
    }

    fn format_logs(&self, entries: &[LogEntry], window: Option<&TimeWindow>) -> String {
        let output = json!({
            "window": window.map(|w| json!({
                "start": w.start.to_rfc3339(),
                "end": w.end.to_rfc3339(),
            })),
            "count": entries.len(),
            "entries": entries,
        });
        serde_json::to_string_pretty(&output).unwrap_or_default()
    }

    fn format_log_detail(&self, entry: &LogEntry, _view: PayloadView) -> String {
        let mut output = serde_json::to_value(entry).unwrap_or_default();
        if let Some(object) = output.as_object_mut() {
            object.insert("duration_secs".to_string(), json!(entry.duration_secs()));
            object.insert(
                "api_base_origin".to_string(),
                json!(entry.api_base_origin()),
            );
        }
        serde_json::to_string_pretty(&output).unwrap_or_default()
    }
}

/// Get appropriate formatter based on JSON flag
///
/// # Arguments
///
/// * `json` - If true, returns a JSON formatter; otherwise returns a table formatter
/// * `timezone` - Timezone the table formatter renders timestamps in
pub fn get_formatter(json: bool, timezone: TimezoneConfig) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter::new(timezone))
    }
}
