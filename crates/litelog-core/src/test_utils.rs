//! Shared test utilities for unit tests
//!
//! Integration tests cannot see this module (it is `#[cfg(test)]`), so
//! `tests/common/mod.rs` in the root crate carries its own builders.

use crate::error::{LitelogError, Result};
use crate::source::LogSource;
use crate::types::{KeyToken, LogEntry, TimeWindow, VirtualKey};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Fixed "now" used by controller tests
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Window of `span_hours` ending `hours_ago` hours before `base_time()`
pub fn window_at(hours_ago: i64, span_hours: i64) -> TimeWindow {
    TimeWindow::ending_at(
        base_time() - Duration::hours(hours_ago),
        Duration::hours(span_hours),
    )
}

/// Minimal successful entry with the given request id
pub fn entry(id: &str) -> LogEntry {
    LogEntry {
        request_id: id.to_string(),
        status: "success".to_string(),
        model: "gpt-4o-mini".to_string(),
        start_time: "2025-03-01T11:00:00Z".to_string(),
        end_time: "2025-03-01T11:00:01Z".to_string(),
        spend: 0.0001,
        total_tokens: Some(12),
        prompt_tokens: Some(8),
        completion_tokens: Some(4),
        user: None,
        metadata: None,
        cache_hit: None,
        custom_llm_provider: None,
        api_base: None,
        request_payload: None,
        response_payload: None,
    }
}

/// Entries with ids `prefix-0 .. prefix-(n-1)`
pub fn entries(prefix: &str, n: usize) -> Vec<LogEntry> {
    (0..n).map(|i| entry(&format!("{prefix}-{i}"))).collect()
}

pub fn key(token: &str) -> VirtualKey {
    VirtualKey {
        token: KeyToken::new(token),
        key_name: format!("sk-...{token}"),
        key_alias: None,
        spend: 0.0,
        created_at: "2025-01-01T00:00:00Z".to_string(),
    }
}

/// Clock that always reports `base_time()`
pub fn fixed_clock() -> Arc<dyn Fn() -> DateTime<Utc> + Send + Sync> {
    Arc::new(base_time)
}

/// Recorded `fetch_logs` call
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    pub token: KeyToken,
    pub window: TimeWindow,
    pub page_size: u32,
}

/// Scripted in-memory source
///
/// `fetch_logs` pops the next page scripted for the token, then the next
/// shared page, then falls back to an empty page. With a gate installed,
/// each fetch waits for one permit before answering.
#[derive(Default)]
pub struct MockSource {
    pages: Mutex<VecDeque<Result<Vec<LogEntry>>>>,
    token_pages: Mutex<HashMap<KeyToken, VecDeque<Vec<LogEntry>>>>,
    keys: Mutex<Vec<VirtualKey>>,
    calls: Mutex<Vec<FetchCall>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a gate that holds every fetch until a permit is added
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn with_keys(self, keys: Vec<VirtualKey>) -> Self {
        *self.keys.lock().unwrap() = keys;
        self
    }

    pub fn push_page(&self, page: Vec<LogEntry>) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_page_for(&self, token: &KeyToken, page: Vec<LogEntry>) {
        self.token_pages
            .lock()
            .unwrap()
            .entry(token.clone())
            .or_default()
            .push_back(page);
    }

    pub fn push_status(&self, status: u16) {
        self.pages
            .lock()
            .unwrap()
            .push_back(Err(LitelogError::Status { status }));
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSource for MockSource {
    async fn fetch_keys(&self) -> Result<Vec<VirtualKey>> {
        Ok(self.keys.lock().unwrap().clone())
    }

    async fn fetch_logs(
        &self,
        token: &KeyToken,
        window: &TimeWindow,
        page_size: u32,
    ) -> Result<Vec<LogEntry>> {
        self.calls.lock().unwrap().push(FetchCall {
            token: token.clone(),
            window: *window,
            page_size,
        });
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(page) = self
            .token_pages
            .lock()
            .unwrap()
            .get_mut(token)
            .and_then(|pages| pages.pop_front())
        {
            return Ok(page);
        }
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
