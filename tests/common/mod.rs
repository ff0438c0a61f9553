//! Common test utilities and helpers for litelog tests
//!
//! This module provides a scripted in-memory log source, entry builders and
//! session constructors shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use litelog::{Session, Settings};
use litelog_core::error::{LitelogError, Result};
use litelog_core::source::LogSource;
use litelog_core::types::{KeyToken, LogEntry, Payload, TimeWindow, VirtualKey};
use once_cell::sync::Lazy;
use std::collections::{HashMap, VecDeque};
use std::env;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

// Global mutex to serialize environment variable modifications in tests
pub static ENV_MUTEX: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

/// Restores environment variables on drop, even if the test panics
#[derive(Default)]
pub struct EnvVarGuard {
    vars: Vec<(String, Option<String>)>,
}

impl EnvVarGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.push((key.to_string(), env::var(key).ok()));
        // Callers hold ENV_MUTEX
        unsafe {
            env::set_var(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.vars.push((key.to_string(), env::var(key).ok()));
        unsafe {
            env::remove_var(key);
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.vars.iter().rev() {
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

/// Common test models used across tests
pub const TEST_MODELS: &[&str] = &["gpt-4o-mini", "claude-3-haiku", "gemini-1.5-flash"];

/// Fixed "now" used with [`fixed_clock`]
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn fixed_clock() -> Arc<dyn Fn() -> DateTime<Utc> + Send + Sync> {
    Arc::new(base_time)
}

/// Builder for creating test LogEntry instances
pub struct LogEntryBuilder {
    request_id: String,
    status: String,
    model: String,
    start: DateTime<Utc>,
    duration_ms: i64,
    spend: f64,
    total_tokens: Option<u64>,
    request_payload: Option<Payload>,
}

impl LogEntryBuilder {
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            status: "success".to_string(),
            model: TEST_MODELS[0].to_string(),
            start: base_time() - Duration::hours(1),
            duration_ms: 1500,
            spend: 0.00042,
            total_tokens: Some(128),
            request_payload: None,
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn with_request_payload(mut self, json: &str) -> Self {
        self.request_payload = Some(Payload::from_bytes(json.as_bytes().to_vec()));
        self
    }

    pub fn build(self) -> LogEntry {
        let end = self.start + Duration::milliseconds(self.duration_ms);
        LogEntry {
            request_id: self.request_id,
            status: self.status,
            model: self.model,
            start_time: self.start.to_rfc3339(),
            end_time: end.to_rfc3339(),
            spend: self.spend,
            total_tokens: self.total_tokens,
            prompt_tokens: self.total_tokens.map(|t| t / 2),
            completion_tokens: self.total_tokens.map(|t| t - t / 2),
            user: None,
            metadata: None,
            cache_hit: None,
            custom_llm_provider: Some("openai".to_string()),
            api_base: Some("https://api.openai.com/v1".to_string()),
            request_payload: self.request_payload,
            response_payload: None,
        }
    }
}

pub fn entry(id: &str) -> LogEntry {
    LogEntryBuilder::new(id).build()
}

/// Entries with ids `prefix-0 .. prefix-(n-1)`, newest first
pub fn entries(prefix: &str, n: usize) -> Vec<LogEntry> {
    (0..n)
        .map(|i| {
            LogEntryBuilder::new(&format!("{prefix}-{i}"))
                .with_start(base_time() - Duration::minutes(i as i64))
                .build()
        })
        .collect()
}

pub fn key(token: &str, alias: Option<&str>) -> VirtualKey {
    VirtualKey {
        token: KeyToken::new(token),
        key_name: format!("sk-...{token}"),
        key_alias: alias.map(str::to_string),
        spend: 0.0,
        created_at: "2025-01-01T00:00:00Z".to_string(),
    }
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
/// Log pages are served per token first, then from the shared queue, then
/// as empty pages. Key lists are served from their own queue; once it runs
/// dry the last successful list is repeated.
#[derive(Default)]
pub struct MockSource {
    pages: Mutex<VecDeque<Result<Vec<LogEntry>>>>,
    token_pages: Mutex<HashMap<KeyToken, VecDeque<Vec<LogEntry>>>>,
    key_lists: Mutex<VecDeque<Result<Vec<VirtualKey>>>>,
    keys: Mutex<Vec<VirtualKey>>,
    calls: Mutex<Vec<FetchCall>>,
    key_fetches: Mutex<usize>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(self, keys: Vec<VirtualKey>) -> Self {
        *self.keys.lock().unwrap() = keys;
        self
    }

    pub fn push_page(&self, page: Vec<LogEntry>) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_page_for(&self, token: &str, page: Vec<LogEntry>) {
        self.token_pages
            .lock()
            .unwrap()
            .entry(KeyToken::new(token))
            .or_default()
            .push_back(page);
    }

    pub fn push_status(&self, status: u16) {
        self.pages
            .lock()
            .unwrap()
            .push_back(Err(LitelogError::Status { status }));
    }

    pub fn push_keys_status(&self, status: u16) {
        self.key_lists
            .lock()
            .unwrap()
            .push_back(Err(LitelogError::Status { status }));
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, token: &str) -> Vec<FetchCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.token.as_str() == token)
            .collect()
    }

    pub fn key_fetches(&self) -> usize {
        *self.key_fetches.lock().unwrap()
    }

    /// Make every later fetch wait for one permit of the returned gate
    pub fn hold_fetches(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    async fn pass_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl LogSource for MockSource {
    async fn fetch_keys(&self) -> Result<Vec<VirtualKey>> {
        *self.key_fetches.lock().unwrap() += 1;
        self.pass_gate().await;
        match self.key_lists.lock().unwrap().pop_front() {
            Some(Ok(keys)) => {
                *self.keys.lock().unwrap() = keys.clone();
                Ok(keys)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.keys.lock().unwrap().clone()),
        }
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
        self.pass_gate().await;
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

/// Settings that pass the "configured" check
pub fn configured_settings() -> Settings {
    Settings {
        base_url: "http://gateway.test:4000".to_string(),
        admin_api_key: "sk-master".to_string(),
        ..Settings::default()
    }
}

/// Session over `source` with the fixed clock
pub fn session_with(source: Arc<MockSource>, settings: Settings) -> Session<MockSource> {
    Session::new(settings, move |_: &Settings| Ok(source.clone())).with_clock(fixed_clock())
}
