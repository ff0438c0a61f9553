//! Presentation-facing application state
//!
//! A [`Session`] owns everything a front end shows: the key list, the
//! selected key, the entries of that key, focus and selection, loading flags
//! and a single last-error slot. Every change goes through an explicit
//! command; nothing is fetched as a side effect of plain assignment.
//!
//! Commands return `Result` so one-shot CLI commands can exit with an error,
//! but every error is also written to the error slot before it is returned.
//! Interactive front ends can ignore the `Result` and render the slot.
//!
//! Fetch commands borrow the session mutably until they finish. The loading
//! flags are therefore also published through an [`Activity`] handle, which
//! a front end clones beforehand and polls while the command runs.

use crate::settings::{Settings, SettingsStore};
use litelog_core::error::{LitelogError, Result};
use litelog_core::pagination::{Clock, FetchActivity, LoadOutcome, PaginationController};
use litelog_core::selection::SelectionTracker;
use litelog_core::source::LogSource;
use litelog_core::types::{KeyToken, LogEntry, TimeWindow, VirtualKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Builds a log source from configured settings
pub type Connector<S> = Box<dyn Fn(&Settings) -> Result<Arc<S>> + Send + Sync>;

/// Loading state of a [`Session`], readable while one of its commands runs
#[derive(Clone, Default)]
pub struct Activity {
    fetches: FetchActivity,
    loading_keys: Arc<AtomicBool>,
    selected_key: Arc<Mutex<Option<KeyToken>>>,
}

impl Activity {
    fn new(fetches: FetchActivity) -> Self {
        Self {
            fetches,
            ..Self::default()
        }
    }

    /// Key the session has selected, updated as soon as a switch starts
    pub fn selected_key(&self) -> Option<KeyToken> {
        self.selected_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_selected_key(&self, token: Option<KeyToken>) {
        *self
            .selected_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn is_loading_keys(&self) -> bool {
        self.loading_keys.load(Ordering::SeqCst)
    }

    /// Whether the selected key's initial window is being fetched
    pub fn is_loading_logs(&self) -> bool {
        self.selected_key()
            .is_some_and(|token| self.fetches.is_loading_latest(&token))
    }

    /// Whether an older window of the selected key is being fetched
    pub fn is_paginating(&self) -> bool {
        self.selected_key()
            .is_some_and(|token| self.fetches.is_paginating(&token))
    }
}

/// Lowers the key-loading flag when the fetch ends or is dropped
struct KeysLoading(Arc<AtomicBool>);

impl KeysLoading {
    fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag.clone())
    }
}

impl Drop for KeysLoading {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Session<S> {
    controller: PaginationController<S>,
    activity: Activity,
    selection: SelectionTracker,
    settings: Settings,
    store: Option<SettingsStore>,
    connect: Connector<S>,
    keys: Vec<VirtualKey>,
    selected_key: Option<KeyToken>,
    entries: Arc<Vec<LogEntry>>,
    window: Option<TimeWindow>,
    error: Option<String>,
}

impl<S: LogSource> Session<S> {
    /// Create a session; when `settings` are incomplete the error slot holds
    /// the configuration message and every fetch fails.
    pub fn new(
        settings: Settings,
        connect: impl Fn(&Settings) -> Result<Arc<S>> + Send + Sync + 'static,
    ) -> Self {
        let mut session = Self {
            controller: PaginationController::new(None),
            activity: Activity::default(),
            selection: SelectionTracker::new(),
            settings,
            store: None,
            connect: Box::new(connect),
            keys: Vec::new(),
            selected_key: None,
            entries: Arc::default(),
            window: None,
            error: None,
        };
        let source = session.connect_source();
        session.controller = PaginationController::new(source);
        session.activity = Activity::new(session.controller.activity());
        session
    }

    /// Persist the last selected key through `store`
    pub fn with_store(mut self, store: SettingsStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the clock used for window computation
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.controller = self.controller.with_clock(clock);
        self
    }

    fn connect_source(&mut self) -> Option<Arc<S>> {
        if !self.settings.is_configured() {
            self.error = Some(LitelogError::not_configured().to_string());
            return None;
        }
        match (self.connect)(&self.settings) {
            Ok(source) => Some(source),
            Err(e) => {
                warn!("Cannot create gateway client: {}", e);
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// Write the outcome of a fetch to the error slot
    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.error = None,
            Err(e) => self.error = Some(e.to_string()),
        }
        result
    }

    /// Set the error slot for a command that failed before fetching
    fn reject<T>(&mut self, error: LitelogError) -> Result<T> {
        self.error = Some(error.to_string());
        Err(error)
    }

    fn set_selected_key(&mut self, token: Option<KeyToken>) {
        self.activity.set_selected_key(token.clone());
        self.selected_key = token;
    }

    fn require_selected_key(&mut self) -> Result<KeyToken> {
        match self.selected_key.clone() {
            Some(token) => Ok(token),
            None => self.reject(LitelogError::InvalidArgument("No key selected".to_string())),
        }
    }

    /// Copy the selected key's cache entry into the visible state
    async fn sync_entries(&mut self) {
        let snapshot = match &self.selected_key {
            Some(token) => self.controller.snapshot(token).await,
            None => None,
        };
        match snapshot {
            Some(cached) => {
                self.entries = Arc::new(cached.entries);
                self.window = Some(cached.window);
            }
            None => {
                self.entries = Arc::default();
                self.window = None;
            }
        }
        self.selection.revalidate(&self.entries);
    }

    /// Fetch the key list without changing the selection
    pub async fn load_keys(&mut self) -> Result<&[VirtualKey]> {
        let loading = KeysLoading::raise(&self.activity.loading_keys);
        let result = self.controller.fetch_keys().await;
        drop(loading);

        self.keys = self.record(result)?;
        Ok(&self.keys)
    }

    /// Drop every cached window, reload the keys and reselect.
    ///
    /// The last selected key is restored when it is still listed, otherwise
    /// the first key is selected.
    pub async fn refresh_keys(&mut self) -> Result<()> {
        self.controller.clear().await;
        self.load_keys().await?;

        let remembered = self
            .settings
            .last_selected_key
            .clone()
            .filter(|token| self.keys.iter().any(|k| &k.token == token));
        let target = remembered.or_else(|| self.keys.first().map(|k| k.token.clone()));

        match target {
            Some(token) => self.select_key(&token).await.map(|_| ()),
            None => {
                self.set_selected_key(None);
                self.selection.reset();
                self.sync_entries().await;
                Ok(())
            }
        }
    }

    /// Same as [`refresh_keys`](Self::refresh_keys)
    pub async fn manual_refresh(&mut self) -> Result<()> {
        self.refresh_keys().await
    }

    /// Select a key and load its latest window unless it is cached
    pub async fn select_key(&mut self, token: &KeyToken) -> Result<LoadOutcome> {
        if !self.keys.iter().any(|k| &k.token == token) {
            return self.reject(LitelogError::InvalidArgument(format!("Unknown key: {token}")));
        }

        if self.selected_key.as_ref() != Some(token) {
            self.selection.reset();
        }
        self.set_selected_key(Some(token.clone()));
        self.remember_key(token);

        let params = self.settings.window_params();
        let result = self.controller.load_latest(token, &params).await;
        self.sync_entries().await;
        self.record(result)
    }

    /// Select the key after (or before) the current one; stops at the ends
    pub async fn select_adjacent_key(&mut self, forward: bool) -> Result<LoadOutcome> {
        let current = self
            .selected_key
            .as_ref()
            .and_then(|token| self.keys.iter().position(|k| &k.token == token));
        let next = match current {
            None => 0,
            Some(index) if forward => (index + 1).min(self.keys.len().saturating_sub(1)),
            Some(index) => index.saturating_sub(1),
        };
        match self.keys.get(next).map(|k| k.token.clone()) {
            Some(token) => self.select_key(&token).await,
            None => self.reject(LitelogError::InvalidArgument("No keys loaded".to_string())),
        }
    }

    /// Find a key by token, alias or name
    pub fn find_key(&self, needle: &str) -> Option<&VirtualKey> {
        self.keys.iter().find(|k| k.matches(needle))
    }

    fn remember_key(&mut self, token: &KeyToken) {
        self.settings.last_selected_key = Some(token.clone());
        if let Some(store) = &self.store
            && let Err(e) = store.remember_key(token)
        {
            warn!("Failed to remember selected key: {}", e);
        }
    }

    /// Load the window before the selected key's current one
    pub async fn load_older(&mut self) -> Result<LoadOutcome> {
        let token = self.require_selected_key()?;
        let params = self.settings.window_params();
        let result = self.controller.load_older(&token, &params).await;
        self.sync_entries().await;
        self.record(result)
    }

    /// Drop the selected key's window and load the latest one
    pub async fn reset_to_latest(&mut self) -> Result<LoadOutcome> {
        let token = self.require_selected_key()?;
        let params = self.settings.window_params();
        let result = self.controller.reset_to_latest(&token, &params).await;
        self.sync_entries().await;
        self.record(result)
    }

    /// Move the keyboard cursor over the current entries
    pub fn move_focus(&mut self, down: bool) {
        self.selection.move_focus(&self.entries, down);
    }

    pub fn select_focused_item(&mut self) {
        self.selection.select_focused_item();
    }

    pub fn clear_focus(&mut self) {
        self.selection.clear_focus();
    }

    /// Select an entry by request id, as a direct click would
    pub fn select_entry(&mut self, request_id: &str) -> Result<()> {
        if !self.entries.iter().any(|e| e.request_id == request_id) {
            return self.reject(LitelogError::InvalidArgument(format!(
                "No log entry with request id {request_id}"
            )));
        }
        self.selection.select(request_id);
        self.selection.clear_focus();
        Ok(())
    }

    /// Take new settings: swap the source, drop all cached windows and
    /// reload the keys when the settings are complete.
    pub async fn apply_settings(&mut self, settings: Settings) -> Result<()> {
        self.settings = settings;
        self.error = None;
        let source = self.connect_source();
        self.controller.set_source(source).await;

        if !self.controller.is_configured() {
            debug!("Settings incomplete, clearing session state");
            self.keys.clear();
            self.set_selected_key(None);
            self.selection.reset();
            self.sync_entries().await;
            let message = self
                .error
                .clone()
                .unwrap_or_else(|| LitelogError::not_configured().to_string());
            return Err(LitelogError::InvalidConfiguration(message));
        }
        self.refresh_keys().await
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn keys(&self) -> &[VirtualKey] {
        &self.keys
    }

    pub fn selected_key(&self) -> Option<&KeyToken> {
        self.selected_key.as_ref()
    }

    /// Entries of the selected key, newest first
    pub fn current_entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Shared handle on the current entries
    pub fn shared_entries(&self) -> Arc<Vec<LogEntry>> {
        self.entries.clone()
    }

    /// Window the current entries cover
    pub fn current_window(&self) -> Option<TimeWindow> {
        self.window
    }

    pub fn focused_id(&self) -> Option<&str> {
        self.selection.focused()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selection.selected()
    }

    /// The entry shown in the detail view
    pub fn selected_entry(&self) -> Option<&LogEntry> {
        let id = self.selection.selected()?;
        self.entries.iter().find(|e| e.request_id == id)
    }

    /// Handle on the loading flags that can be read while a command runs
    pub fn activity(&self) -> Activity {
        self.activity.clone()
    }

    pub fn is_loading_keys(&self) -> bool {
        self.activity.is_loading_keys()
    }

    /// Whether the selected key's initial window is being fetched
    pub fn is_loading_logs(&self) -> bool {
        self.activity.is_loading_logs()
    }

    /// Whether an older window of the selected key is being fetched
    pub fn is_paginating(&self) -> bool {
        self.activity.is_paginating()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}
