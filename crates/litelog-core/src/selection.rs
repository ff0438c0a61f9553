//! Selected and focused log entries
//!
//! "Selected" is the entry shown in the detail view; "focused" is the
//! keyboard cursor. Both are request ids and are only meaningful against the
//! entry list of the key they were picked from.

use crate::types::LogEntry;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: Option<String>,
    focused: Option<String>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Move the cursor one row down or up.
    ///
    /// With nothing focused (or a focus that is not in `entries`) this lands
    /// on the first row when moving down and the last row when moving up.
    /// At either end the cursor stays put.
    pub fn move_focus(&mut self, entries: &[LogEntry], down: bool) {
        if entries.is_empty() {
            self.focused = None;
            return;
        }

        let current = self
            .focused
            .as_deref()
            .and_then(|id| entries.iter().position(|e| e.request_id == id));

        let next = match current {
            None if down => 0,
            None => entries.len() - 1,
            Some(index) if down => (index + 1).min(entries.len() - 1),
            Some(index) => index.saturating_sub(1),
        };
        self.focused = Some(entries[next].request_id.clone());
    }

    /// Promote the focused entry to selected
    pub fn select_focused_item(&mut self) {
        if let Some(id) = &self.focused {
            self.selected = Some(id.clone());
        }
    }

    /// Forget the cursor but keep the selection (used on direct clicks)
    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    /// Select an entry directly
    pub fn select(&mut self, id: impl Into<String>) {
        self.selected = Some(id.into());
    }

    /// Drop ids that are no longer present in `entries`
    pub fn revalidate(&mut self, entries: &[LogEntry]) {
        let present = |id: &Option<String>| {
            id.as_deref()
                .is_some_and(|id| entries.iter().any(|e| e.request_id == id))
        };
        if !present(&self.selected) {
            self.selected = None;
        }
        if !present(&self.focused) {
            self.focused = None;
        }
    }

    /// Forget both ids (used when switching keys)
    pub fn reset(&mut self) {
        self.selected = None;
        self.focused = None;
    }
}
