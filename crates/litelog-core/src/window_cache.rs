//! Per-key window cache
//!
//! Holds, for each key token, the contiguous newest-first list of entries
//! already fetched and the time window they cover. The cache does no
//! deduplication of its own; the pagination controller filters pages before
//! handing them over.

use crate::types::{KeyToken, LogEntry, TimeWindow};
use std::collections::HashMap;
use tracing::debug;

/// Entries loaded for one key and the window they span
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub entries: Vec<LogEntry>,
    pub window: TimeWindow,
}

/// Token-keyed store of loaded windows
#[derive(Debug, Default)]
pub struct WindowCache {
    entries: HashMap<KeyToken, CacheEntry>,
}

impl WindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for `token`, if any
    pub fn get(&self, token: &KeyToken) -> Option<&CacheEntry> {
        self.entries.get(token)
    }

    pub fn contains(&self, token: &KeyToken) -> bool {
        self.entries.contains_key(token)
    }

    /// Replace whatever is cached for `token`
    pub fn put(&mut self, token: KeyToken, entries: Vec<LogEntry>, window: TimeWindow) {
        debug!(
            "Caching {} entries for {} over {} .. {}",
            entries.len(),
            token,
            window.start,
            window.end
        );
        self.entries.insert(token, CacheEntry { entries, window });
    }

    /// Append older entries and move the window start back.
    ///
    /// Returns `false` without touching anything when `token` has no entry.
    pub fn extend(
        &mut self,
        token: &KeyToken,
        older: Vec<LogEntry>,
        new_window_start: chrono::DateTime<chrono::Utc>,
    ) -> bool {
        match self.entries.get_mut(token) {
            Some(cached) => {
                cached.entries.extend(older);
                cached.window.start = new_window_start;
                true
            }
            None => {
                debug!("Ignoring extend for uncached key {}", token);
                false
            }
        }
    }

    /// Drop the entry for one token
    pub fn invalidate(&mut self, token: &KeyToken) {
        self.entries.remove(token);
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
