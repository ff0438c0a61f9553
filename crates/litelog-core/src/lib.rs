//! Core types, traits, and state machines for litelog
//!
//! This crate provides the domain types, error handling, the `LogSource`
//! trait, and the windowed log cache with its pagination controller and
//! focus tracker. The HTTP client and terminal output live in sibling crates.

pub mod error;
pub mod pagination;
pub mod selection;
pub mod source;
pub mod timezone;
pub mod types;
pub mod window_cache;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{LitelogError, Result};
pub use pagination::{FetchActivity, LoadOutcome, PaginationController};
pub use selection::SelectionTracker;
pub use source::LogSource;
pub use types::{KeyToken, LogEntry, Payload, TimeWindow, VirtualKey, WindowParams};
pub use window_cache::{CacheEntry, WindowCache};
