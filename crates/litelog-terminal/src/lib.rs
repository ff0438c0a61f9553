//! Terminal output formatting for litelog
//!
//! This crate provides table and JSON formatters for keys, log lists and
//! log details, payload pretty-printing and the chat view of payloads, and
//! the frame drawn by the interactive browser.

pub mod browser_view;
pub mod conversation;
pub mod output;
pub mod payload;

pub use browser_view::{BrowserFrame, BrowserView};
pub use output::{JsonFormatter, OutputFormatter, TableFormatter, get_formatter};
pub use conversation::format_conversation;
pub use payload::{PayloadView, pretty_payload};
