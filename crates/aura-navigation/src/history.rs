//! Visit history index
//!
//! At most one entry per URL. A repeat visit overwrites the title, bumps
//! the visit count, and moves the entry to the front, so the list is
//! always in recency order and capacity eviction truncates from the tail.
//! The privacy gate lives in the orchestrator; this index records
//! unconditionally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use aura_cache::CacheStore;

/// Memoized search results live this long; stale results inside the
/// window are accepted.
const SEARCH_TTL: Duration = Duration::from_secs(5 * 60);

const SEARCH_CACHE_PREFIX: &str = "history:search:";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Last visit time
    pub timestamp: DateTime<Utc>,
    pub visit_count: u32,
    pub favicon: Option<String>,
}

pub struct HistoryIndex {
    /// Most recently visited first
    entries: Vec<HistoryEntry>,
    cache: Arc<CacheStore>,
}

impl HistoryIndex {
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self {
            entries: Vec::new(),
            cache,
        }
    }

    pub fn from_entries(entries: Vec<HistoryEntry>, cache: Arc<CacheStore>) -> Self {
        Self { entries, cache }
    }

    /// Record a visit. Repeat visits to a known URL update the existing
    /// entry and move it to the front; new URLs are inserted at the front
    /// and the list is truncated to `max_items` from the tail.
    pub fn record(
        &mut self,
        title: &str,
        url: &str,
        favicon: Option<String>,
        max_items: usize,
    ) {
        if let Some(index) = self.entries.iter().position(|e| e.url == url) {
            let mut entry = self.entries.remove(index);
            entry.title = title.to_string();
            entry.timestamp = Utc::now();
            entry.visit_count += 1;
            if favicon.is_some() {
                entry.favicon = favicon;
            }
            self.entries.insert(0, entry);
        } else {
            self.entries.insert(
                0,
                HistoryEntry {
                    id: Uuid::new_v4().to_string(),
                    title: title.to_string(),
                    url: url.to_string(),
                    timestamp: Utc::now(),
                    visit_count: 1,
                    favicon,
                },
            );
            self.entries.truncate(max_items);
        }

        self.invalidate_search_cache();
    }

    /// Remove one entry by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);

        let removed = self.entries.len() != before;
        if removed {
            self.invalidate_search_cache();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.invalidate_search_cache();
    }

    /// Case-insensitive substring search over title and url, memoized per
    /// lowercased query.
    pub fn search(&self, query: &str) -> Vec<HistoryEntry> {
        let needle = query.to_lowercase();
        let key = format!("{SEARCH_CACHE_PREFIX}{needle}");

        if let Some(hit) = self.cache.get::<Vec<HistoryEntry>>(&key) {
            tracing::debug!(query = %needle, "History search cache hit");
            return hit;
        }

        let results: Vec<HistoryEntry> = self
            .entries
            .iter()
            .filter(|e| {
                e.title.to_lowercase().contains(&needle) || e.url.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        self.cache.set(&key, &results, Some(SEARCH_TTL));
        results
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn invalidate_search_cache(&self) {
        self.cache.invalidate_prefix(SEARCH_CACHE_PREFIX);
    }
}
