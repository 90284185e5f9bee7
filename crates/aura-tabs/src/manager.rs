//! Tab Manager
//!
//! List operations only: URL resolution and title derivation happen in the
//! orchestrator before tabs reach this type. Lookups that miss are no-ops,
//! since UI-driven calls cannot rely on exhaustive pre-checks.

use serde::{Deserialize, Serialize};

use crate::tab::{ClosedTab, Tab};

/// Maximum number of entries in the recently-closed ring.
pub const CLOSED_TAB_LIMIT: usize = 50;

#[derive(Debug, Default)]
pub struct TabManager {
    /// Open tabs, in creation order
    active: Vec<Tab>,
    /// Recently closed, newest first
    closed: Vec<ClosedTab>,
    /// Id of the current tab; always a member of `active` when set
    current: Option<String>,
}

/// Serializable whole-partition snapshot of tab state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TabsSnapshot {
    pub active: Vec<Tab>,
    pub closed: Vec<ClosedTab>,
    pub current: Option<String>,
}

impl TabManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new tab and make it current. Returns the tab id.
    pub fn open(&mut self, tab: Tab) -> String {
        let id = tab.id.clone();
        tracing::info!(tab_id = %id, url = %tab.url, "Opened tab");

        self.active.push(tab);
        self.current = Some(id.clone());
        id
    }

    /// Move a tab from the active list into the closed ring. Returns the
    /// closed tab, or `None` if the id is unknown.
    pub fn close(&mut self, tab_id: &str) -> Option<ClosedTab> {
        let index = self.active.iter().position(|t| t.id == tab_id)?;
        let closed = self.active.remove(index).into_closed();

        self.closed.insert(0, closed.clone());
        self.closed.truncate(CLOSED_TAB_LIMIT);

        if self.current.as_deref() == Some(tab_id) {
            self.current = self.active.last().map(|t| t.id.clone());
        }

        tracing::info!(tab_id = %tab_id, "Closed tab");
        Some(closed)
    }

    /// Close every active tab in one batch. The batch lands at the front
    /// of the ring in its original order; the ring is then trimmed.
    pub fn close_all(&mut self) {
        let count = self.active.len();
        let mut batch: Vec<ClosedTab> = self
            .active
            .drain(..)
            .map(Tab::into_closed)
            .collect();
        batch.append(&mut self.closed);

        self.closed = batch;
        self.closed.truncate(CLOSED_TAB_LIMIT);
        self.current = None;

        tracing::info!(count, "Closed all tabs");
    }

    /// Move a tab from the closed ring back to the active list, preserving
    /// its original `created_at`, and make it current.
    pub fn restore(&mut self, tab_id: &str) -> Option<Tab> {
        let index = self.closed.iter().position(|t| t.id == tab_id)?;
        let tab = self.closed.remove(index).into_tab();

        self.active.push(tab.clone());
        self.current = Some(tab.id.clone());

        tracing::info!(tab_id = %tab_id, "Restored tab");
        Some(tab)
    }

    /// Empty the closed ring. Active tabs are unaffected.
    pub fn clear_closed(&mut self) {
        self.closed.clear();
    }

    /// Update a tab's url and title in place.
    pub fn update_url(&mut self, tab_id: &str, url: String, title: String) -> Option<&Tab> {
        let tab = self.active.iter_mut().find(|t| t.id == tab_id)?;
        tab.url = url;
        tab.title = title;
        Some(tab)
    }

    pub fn set_favicon(&mut self, tab_id: &str, favicon_url: Option<String>) {
        if let Some(tab) = self.active.iter_mut().find(|t| t.id == tab_id) {
            tab.favicon_url = favicon_url;
        }
    }

    /// Make a tab current. Ignored unless the id names an active tab.
    pub fn set_active(&mut self, tab_id: &str) {
        if self.active.iter().any(|t| t.id == tab_id) {
            self.current = Some(tab_id.to_string());
        } else {
            tracing::debug!(tab_id = %tab_id, "set_active ignored unknown tab");
        }
    }

    pub fn current(&self) -> Option<&Tab> {
        let id = self.current.as_deref()?;
        self.active.iter().find(|t| t.id == id)
    }

    pub fn get(&self, tab_id: &str) -> Option<&Tab> {
        self.active.iter().find(|t| t.id == tab_id)
    }

    pub fn active_tabs(&self) -> &[Tab] {
        &self.active
    }

    pub fn closed_tabs(&self) -> &[ClosedTab] {
        &self.closed
    }

    pub fn snapshot(&self) -> TabsSnapshot {
        TabsSnapshot {
            active: self.active.clone(),
            closed: self.closed.clone(),
            current: self.current.clone(),
        }
    }

    /// Rebuild from a persisted snapshot, re-establishing the invariants:
    /// ring disjoint from the active set and trimmed to its cap, current
    /// cleared if it names no active tab.
    pub fn from_snapshot(snapshot: TabsSnapshot) -> Self {
        let TabsSnapshot {
            active,
            mut closed,
            current,
        } = snapshot;

        closed.retain(|c| !active.iter().any(|t| t.id == c.id));
        closed.truncate(CLOSED_TAB_LIMIT);
        let current = current.filter(|id| active.iter().any(|t| &t.id == id));

        Self {
            active,
            closed,
            current,
        }
    }
}
