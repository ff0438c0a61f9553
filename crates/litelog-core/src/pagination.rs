//! Pagination controller for windowed log fetches
//!
//! The controller is the only component that talks to the [`LogSource`] and
//! the only writer of the [`WindowCache`]. It exposes three operations:
//!
//! - [`load_latest`](PaginationController::load_latest) fetches
//!   `[now - lookback, now]` for a key unless that key is already cached.
//! - [`load_older`](PaginationController::load_older) fetches the window
//!   just before the cached one and appends the entries it has not seen yet.
//! - [`reset_to_latest`](PaginationController::reset_to_latest) drops the
//!   key's cache entry and loads the latest window again.
//!
//! At most one fetch per key token is in flight at a time. A call that finds
//! its key busy returns [`LoadOutcome::Busy`] instead of queueing. Results are
//! always written under the token they were requested for, so a fetch that
//! completes after the caller switched keys still lands in the right place.
//!
//! A failed fetch leaves the cache exactly as it was.
//!
//! # Example
//!
//! ```no_run
//! use litelog_core::{KeyToken, LogSource, PaginationController, WindowParams};
//! use std::sync::Arc;
//!
//! async fn browse<S: LogSource>(source: Arc<S>) -> litelog_core::Result<()> {
//!     let controller = PaginationController::new(Some(source));
//!     let token = KeyToken::new("sk-1234");
//!     let params = WindowParams::new(24, 50);
//!
//!     controller.load_latest(&token, &params).await?;
//!     controller.load_older(&token, &params).await?;
//!     println!("{} entries", controller.entries(&token).await.len());
//!     Ok(())
//! }
//! ```

use crate::error::{LitelogError, Result};
use crate::source::LogSource;
use crate::types::{KeyToken, LogEntry, TimeWindow, VirtualKey, WindowParams};
use crate::window_cache::{CacheEntry, WindowCache};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Source of "now" for window computation
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// What a load operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched; `appended` entries survived deduplication
    Fetched { received: usize, appended: usize },
    /// The key already had a cached window, nothing was fetched
    Cached,
    /// Another fetch for the key is still running, nothing was done
    Busy,
}

impl LoadOutcome {
    /// Whether a request actually went out
    pub fn fetched(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Latest,
    Older,
}

/// In-flight flags for one token
#[derive(Debug, Default, Clone, Copy)]
struct InFlight {
    latest: bool,
    older: bool,
}

impl InFlight {
    fn any(&self) -> bool {
        self.latest || self.older
    }

    fn set(&mut self, kind: FetchKind, value: bool) {
        match kind {
            FetchKind::Latest => self.latest = value,
            FetchKind::Older => self.older = value,
        }
    }
}

type InFlightMap = Arc<Mutex<HashMap<KeyToken, InFlight>>>;

fn lock(map: &InFlightMap) -> MutexGuard<'_, HashMap<KeyToken, InFlight>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight flag when the fetch finishes or is dropped
struct FetchGuard {
    in_flight: InFlightMap,
    token: KeyToken,
    kind: FetchKind,
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        let mut map = lock(&self.in_flight);
        if let Some(flags) = map.get_mut(&self.token) {
            flags.set(self.kind, false);
            if !flags.any() {
                map.remove(&self.token);
            }
        }
    }
}

/// Read-only handle on the in-flight flags of a controller
///
/// Cloning is cheap and the handle stays valid while the controller itself
/// is mutably borrowed by a running fetch, so a front end can poll it to
/// draw loading indicators.
#[derive(Clone, Default)]
pub struct FetchActivity {
    in_flight: InFlightMap,
}

impl FetchActivity {
    fn flags(&self, token: &KeyToken) -> InFlight {
        lock(&self.in_flight)
            .get(token)
            .copied()
            .unwrap_or_default()
    }

    /// Whether the initial window for `token` is being fetched
    pub fn is_loading_latest(&self, token: &KeyToken) -> bool {
        self.flags(token).latest
    }

    /// Whether an older window for `token` is being fetched
    pub fn is_paginating(&self, token: &KeyToken) -> bool {
        self.flags(token).older
    }

    /// Whether any fetch for `token` is running
    pub fn is_busy(&self, token: &KeyToken) -> bool {
        self.flags(token).any()
    }

    /// Mark a fetch for `token` as started, unless one is already running
    fn begin(&self, token: &KeyToken, kind: FetchKind) -> Option<FetchGuard> {
        let mut map = lock(&self.in_flight);
        let flags = map.entry(token.clone()).or_default();
        if flags.any() {
            debug!("Fetch for {} already in flight, ignoring {:?}", token, kind);
            return None;
        }
        flags.set(kind, true);
        Some(FetchGuard {
            in_flight: self.in_flight.clone(),
            token: token.clone(),
            kind,
        })
    }
}

/// Mediates every read and write of the window cache
pub struct PaginationController<S> {
    source: Option<Arc<S>>,
    cache: Arc<RwLock<WindowCache>>,
    activity: FetchActivity,
    clock: Clock,
}

impl<S: LogSource> PaginationController<S> {
    /// Create a controller; `None` means settings are incomplete and every
    /// fetch fails with `InvalidConfiguration`.
    pub fn new(source: Option<Arc<S>>) -> Self {
        Self {
            source,
            cache: Arc::new(RwLock::new(WindowCache::new())),
            activity: FetchActivity::default(),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the clock used to compute "now"
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Swap the remote source and drop every cached window.
    ///
    /// Fetches already running against the old source still complete and
    /// write back under their own token.
    pub async fn set_source(&mut self, source: Option<Arc<S>>) {
        self.source = source;
        self.clear().await;
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    fn source(&self) -> Result<Arc<S>> {
        self.source.clone().ok_or_else(LitelogError::not_configured)
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Handle on the in-flight flags that outlives borrows of `self`
    pub fn activity(&self) -> FetchActivity {
        self.activity.clone()
    }

    /// Whether the initial window for `token` is being fetched
    pub fn is_loading_latest(&self, token: &KeyToken) -> bool {
        self.activity.is_loading_latest(token)
    }

    /// Whether an older window for `token` is being fetched
    pub fn is_paginating(&self, token: &KeyToken) -> bool {
        self.activity.is_paginating(token)
    }

    /// Whether any fetch for `token` is running
    pub fn is_busy(&self, token: &KeyToken) -> bool {
        self.activity.is_busy(token)
    }

    /// List the gateway's virtual keys
    pub async fn fetch_keys(&self) -> Result<Vec<VirtualKey>> {
        let source = self.source()?;
        let keys = source.fetch_keys().await.inspect_err(|e| {
            warn!("Failed to fetch keys: {}", e);
        })?;
        info!("Fetched {} virtual keys", keys.len());
        Ok(keys)
    }

    /// Load `[now - lookback, now]` for `token` unless it is already cached.
    pub async fn load_latest(&self, token: &KeyToken, params: &WindowParams) -> Result<LoadOutcome> {
        let source = self.source()?;
        let Some(guard) = self.activity.begin(token, FetchKind::Latest) else {
            return Ok(LoadOutcome::Busy);
        };
        if self.cache.read().await.contains(token) {
            return Ok(LoadOutcome::Cached);
        }
        self.fetch_latest(&source, token, params, guard).await
    }

    /// Fetch the latest window and replace the cache entry; `_guard` keeps
    /// the token marked busy until the entry is written.
    async fn fetch_latest(
        &self,
        source: &S,
        token: &KeyToken,
        params: &WindowParams,
        _guard: FetchGuard,
    ) -> Result<LoadOutcome> {
        let window = TimeWindow::ending_at(self.now(), params.lookback());
        let fetched = source
            .fetch_logs(token, &window, params.page_size())
            .await
            .inspect_err(|e| warn!("Failed to fetch logs for {}: {}", token, e))?;

        let received = fetched.len();
        let entries = dedup_against(HashSet::new(), fetched);
        let appended = entries.len();
        info!(
            "Loaded {} entries for {} ({} .. {})",
            appended, token, window.start, window.end
        );
        self.cache.write().await.put(token.clone(), entries, window);
        Ok(LoadOutcome::Fetched { received, appended })
    }

    /// Fetch the window just before the cached one and append unseen entries.
    ///
    /// Without a cached window the boundary falls back to `now - lookback`.
    pub async fn load_older(&self, token: &KeyToken, params: &WindowParams) -> Result<LoadOutcome> {
        let source = self.source()?;
        let Some(_guard) = self.activity.begin(token, FetchKind::Older) else {
            return Ok(LoadOutcome::Busy);
        };

        let lookback = params.lookback();
        let current = self
            .cache
            .read()
            .await
            .get(token)
            .map(|cached| cached.window)
            .unwrap_or_else(|| TimeWindow::ending_at(self.now(), lookback));
        let window = current.preceding(lookback);

        let fetched = source
            .fetch_logs(token, &window, params.page_size())
            .await
            .inspect_err(|e| warn!("Failed to fetch older logs for {}: {}", token, e))?;
        let received = fetched.len();

        let mut cache = self.cache.write().await;
        let existing: HashSet<String> = cache
            .get(token)
            .map(|cached| cached.entries.iter().map(|e| e.request_id.clone()).collect())
            .unwrap_or_default();
        let fresh = dedup_against(existing, fetched);
        let appended = fresh.len();
        if received > appended {
            debug!(
                "Dropped {} duplicate entries for {}",
                received - appended,
                token
            );
        }

        if cache.contains(token) {
            cache.extend(token, fresh, window.start);
        } else {
            // Never loaded, or cleared mid-flight: keep the page with the
            // window it actually covers.
            cache.put(token.clone(), fresh, window);
        }
        info!(
            "Loaded {} older entries for {}, window now starts at {}",
            appended, token, window.start
        );
        Ok(LoadOutcome::Fetched { received, appended })
    }

    /// Drop the cached window for `token` and load the latest one.
    ///
    /// While another fetch for `token` is running this does nothing and
    /// returns `Busy`, keeping the current entries on screen. The token is
    /// marked busy before the entry is dropped, so no other fetch can slip
    /// in between.
    pub async fn reset_to_latest(
        &self,
        token: &KeyToken,
        params: &WindowParams,
    ) -> Result<LoadOutcome> {
        let source = self.source()?;
        let Some(guard) = self.activity.begin(token, FetchKind::Latest) else {
            return Ok(LoadOutcome::Busy);
        };
        self.invalidate(token).await;
        self.fetch_latest(&source, token, params, guard).await
    }

    /// Drop the cached window for one key
    pub async fn invalidate(&self, token: &KeyToken) {
        self.cache.write().await.invalidate(token);
    }

    /// Drop every cached window
    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }

    /// Copy of the cached entry for `token`
    pub async fn snapshot(&self, token: &KeyToken) -> Option<CacheEntry> {
        self.cache.read().await.get(token).cloned()
    }

    /// Cached entries for `token`, newest first; empty when nothing is cached
    pub async fn entries(&self, token: &KeyToken) -> Vec<LogEntry> {
        self.cache
            .read()
            .await
            .get(token)
            .map(|cached| cached.entries.clone())
            .unwrap_or_default()
    }

    /// Cached window for `token`
    pub async fn window(&self, token: &KeyToken) -> Option<TimeWindow> {
        self.cache.read().await.get(token).map(|cached| cached.window)
    }

    /// Whether `token` has a cached window
    pub async fn is_cached(&self, token: &KeyToken) -> bool {
        self.cache.read().await.contains(token)
    }
}

/// Keep entries whose request id is not in `seen`, in their original order.
///
/// Ids are added to `seen` as they are accepted, so repeats inside the page
/// are dropped too.
pub fn dedup_against(mut seen: HashSet<String>, page: Vec<LogEntry>) -> Vec<LogEntry> {
    page.into_iter()
        .filter(|entry| seen.insert(entry.request_id.clone()))
        .collect()
}
