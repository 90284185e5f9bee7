//! Bookmark index
//!
//! Folder/tag-organized saved locations. A URL may be bookmarked into
//! multiple folders as separate entries; that is a product decision, not
//! an oversight, so there is deliberately no deduplication here. Entries
//! are never auto-evicted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use aura_cache::CacheStore;

const SEARCH_TTL: Duration = Duration::from_secs(5 * 60);

// Separate namespace from history search to avoid key collisions.
const SEARCH_CACHE_PREFIX: &str = "bookmarks:search:";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookmarkEntry {
    pub id: String,
    pub title: String,
    pub url: String,
    pub favicon: Option<String>,
    pub folder: String,
    pub tags: Vec<String>,
    pub date_added: DateTime<Utc>,
}

/// Optional-field patch for `update`.
#[derive(Debug, Clone, Default)]
pub struct BookmarkPatch {
    pub title: Option<String>,
    pub url: Option<String>,
    pub favicon: Option<String>,
    pub folder: Option<String>,
    pub tags: Option<Vec<String>>,
}

pub struct BookmarkIndex {
    /// Newest first
    entries: Vec<BookmarkEntry>,
    cache: Arc<CacheStore>,
}

impl BookmarkIndex {
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self {
            entries: Vec::new(),
            cache,
        }
    }

    pub fn from_entries(entries: Vec<BookmarkEntry>, cache: Arc<CacheStore>) -> Self {
        Self { entries, cache }
    }

    pub fn add(
        &mut self,
        title: String,
        url: String,
        folder: String,
        tags: Vec<String>,
    ) -> String {
        let entry = BookmarkEntry {
            id: Uuid::new_v4().to_string(),
            title,
            url,
            favicon: None,
            folder,
            tags,
            date_added: Utc::now(),
        };
        let id = entry.id.clone();

        tracing::info!(bookmark_id = %id, url = %entry.url, folder = %entry.folder, "Added bookmark");
        self.entries.insert(0, entry);
        self.invalidate_search_cache();
        id
    }

    /// Remove by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);

        let removed = self.entries.len() != before;
        if removed {
            self.invalidate_search_cache();
        }
        removed
    }

    pub fn update(&mut self, id: &str, patch: BookmarkPatch) -> bool {
        let entry = match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => entry,
            None => return false,
        };

        if let Some(title) = patch.title {
            entry.title = title;
        }
        if let Some(url) = patch.url {
            entry.url = url;
        }
        if let Some(favicon) = patch.favicon {
            entry.favicon = Some(favicon);
        }
        if let Some(folder) = patch.folder {
            entry.folder = folder;
        }
        if let Some(tags) = patch.tags {
            entry.tags = tags;
        }

        self.invalidate_search_cache();
        true
    }

    /// Case-insensitive substring search over title, url, folder, and
    /// tags, memoized per lowercased query.
    pub fn search(&self, query: &str) -> Vec<BookmarkEntry> {
        let needle = query.to_lowercase();
        let key = format!("{SEARCH_CACHE_PREFIX}{needle}");

        if let Some(hit) = self.cache.get::<Vec<BookmarkEntry>>(&key) {
            tracing::debug!(query = %needle, "Bookmark search cache hit");
            return hit;
        }

        let results: Vec<BookmarkEntry> = self
            .entries
            .iter()
            .filter(|e| {
                e.title.to_lowercase().contains(&needle)
                    || e.url.to_lowercase().contains(&needle)
                    || e.folder.to_lowercase().contains(&needle)
                    || e.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();

        self.cache.set(&key, &results, Some(SEARCH_TTL));
        results
    }

    /// True if any entry, in any folder, has this exact URL.
    pub fn is_bookmarked(&self, url: &str) -> bool {
        self.entries.iter().any(|e| e.url == url)
    }

    pub fn entries(&self) -> &[BookmarkEntry] {
        &self.entries
    }

    fn invalidate_search_cache(&self) {
        self.cache.invalidate_prefix(SEARCH_CACHE_PREFIX);
    }
}
