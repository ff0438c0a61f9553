//! Remote log source trait
//!
//! The pagination controller talks to the gateway only through this trait,
//! so tests can substitute an in-memory source for the HTTP client.

use crate::error::Result;
use crate::types::{KeyToken, LogEntry, TimeWindow, VirtualKey};
use async_trait::async_trait;

/// A paged, time-windowed source of log entries.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// List all virtual keys visible to the admin credential.
    async fn fetch_keys(&self) -> Result<Vec<VirtualKey>>;

    /// Fetch up to `page_size` entries for `token` inside `window`,
    /// newest first. An empty list is a valid result.
    async fn fetch_logs(
        &self,
        token: &KeyToken,
        window: &TimeWindow,
        page_size: u32,
    ) -> Result<Vec<LogEntry>>;
}

