//! Session orchestrator
//!
//! The one owner of the composed browsing-state snapshot. UI events route
//! through here to the index/manager that owns the data; every mutation
//! schedules a debounced whole-partition write. The privacy gate for
//! automatic history recording is enforced here and only here.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aura_cache::CacheStore;
use aura_download::{DownloadLedger, DownloadPatch, DownloadRecord};
use aura_navigation::{
    title_for_url, HistoryEntry, HistoryIndex, InputResolution, InputResolver,
};
use aura_storage::{Partition, PartitionStore, SqliteStore};
use aura_tabs::{ClosedTab, Tab, TabManager, TabsSnapshot};

use crate::bookmarks::{BookmarkEntry, BookmarkIndex, BookmarkPatch};
use crate::persist::{PersistScheduler, DEFAULT_DEBOUNCE};
use crate::settings::{Settings, SettingsPatch};

/// Navigation state reported by the rendering surface.
#[derive(Debug, Clone)]
pub struct NavigationSnapshot {
    pub url: String,
    pub title: String,
    pub loading: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

pub struct Browser {
    settings: Arc<RwLock<Settings>>,
    tabs: Arc<RwLock<TabManager>>,
    history: Arc<RwLock<HistoryIndex>>,
    bookmarks: Arc<RwLock<BookmarkIndex>>,
    downloads: Arc<RwLock<DownloadLedger>>,
    resolver: Arc<RwLock<InputResolver>>,
    cache: Arc<CacheStore>,
    store: Arc<dyn PartitionStore>,
    scheduler: Arc<PersistScheduler>,
    initialized: Arc<AtomicBool>,
}

impl Browser {
    /// Open a browser over a SQLite profile at `path` with default cache
    /// settings. Call `initialize` afterwards to load state.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let store: Arc<dyn PartitionStore> = Arc::new(SqliteStore::open(path)?);
        Ok(Self::new(store, Arc::new(CacheStore::default())))
    }

    pub fn new(store: Arc<dyn PartitionStore>, cache: Arc<CacheStore>) -> Self {
        Self::with_debounce(store, cache, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(
        store: Arc<dyn PartitionStore>,
        cache: Arc<CacheStore>,
        debounce: Duration,
    ) -> Self {
        let scheduler = Arc::new(PersistScheduler::new(Arc::clone(&store), debounce));

        Self {
            settings: Arc::new(RwLock::new(Settings::default())),
            tabs: Arc::new(RwLock::new(TabManager::new())),
            history: Arc::new(RwLock::new(HistoryIndex::new(Arc::clone(&cache)))),
            bookmarks: Arc::new(RwLock::new(BookmarkIndex::new(Arc::clone(&cache)))),
            downloads: Arc::new(RwLock::new(DownloadLedger::new())),
            resolver: Arc::new(RwLock::new(InputResolver::default())),
            cache,
            store,
            scheduler,
            initialized: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load all partitions and open a default tab if none survived.
    /// Idempotent: calling twice never creates duplicate default tabs.
    pub fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("initialize called twice; ignoring");
            return;
        }

        let settings: Settings = self.load_partition(Partition::Settings);
        self.resolver.write().set_engine(&settings.search_engine);
        *self.settings.write() = settings;

        let snapshot: TabsSnapshot = self.load_partition(Partition::Tabs);
        *self.tabs.write() = TabManager::from_snapshot(snapshot);

        let entries: Vec<HistoryEntry> = self.load_partition(Partition::History);
        *self.history.write() = HistoryIndex::from_entries(entries, Arc::clone(&self.cache));

        let entries: Vec<BookmarkEntry> = self.load_partition(Partition::Bookmarks);
        *self.bookmarks.write() = BookmarkIndex::from_entries(entries, Arc::clone(&self.cache));

        let records: Vec<DownloadRecord> = self.load_partition(Partition::Downloads);
        *self.downloads.write() = DownloadLedger::from_records(records);

        if self.tabs.read().active_tabs().is_empty() {
            self.create_tab(None);
        }

        tracing::info!(
            tabs = self.tabs.read().active_tabs().len(),
            history = self.history.read().len(),
            bookmarks = self.bookmarks.read().entries().len(),
            downloads = self.downloads.read().records().len(),
            "Browser state loaded"
        );
    }

    // === Tab operations ===

    /// Open a new tab and make it current. `None` opens the homepage;
    /// anything else goes through the input resolver.
    pub fn create_tab(&self, input: Option<&str>) -> String {
        let url = match input {
            Some(input) => self.resolver.read().resolve(input).into_url(),
            None => self.settings.read().homepage.clone(),
        };
        let title = title_for_url(&url);

        let id = self.tabs.write().open(Tab::new(url, title));
        self.persist(Partition::Tabs);
        id
    }

    pub fn close_tab(&self, tab_id: &str) {
        if self.tabs.write().close(tab_id).is_some() {
            self.persist(Partition::Tabs);
        }
    }

    pub fn close_all_tabs(&self) {
        self.tabs.write().close_all();
        self.persist(Partition::Tabs);
    }

    pub fn restore_tab(&self, tab_id: &str) {
        if self.tabs.write().restore(tab_id).is_some() {
            self.persist(Partition::Tabs);
        }
    }

    pub fn clear_closed_tabs(&self) {
        self.tabs.write().clear_closed();
        self.persist(Partition::Tabs);
    }

    pub fn set_active_tab(&self, tab_id: &str) {
        self.tabs.write().set_active(tab_id);
        self.persist(Partition::Tabs);
    }

    pub fn set_tab_favicon(&self, tab_id: &str, favicon_url: Option<String>) {
        self.tabs.write().set_favicon(tab_id, favicon_url);
        self.persist(Partition::Tabs);
    }

    /// Re-resolve `input` for an existing tab. The title falls back to a
    /// hostname-derived one, and the visit is recorded through the
    /// privacy gate.
    pub fn update_tab_url(&self, tab_id: &str, input: &str, title: Option<&str>) {
        let url = self.resolver.read().resolve(input).into_url();
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| title_for_url(&url));

        let updated = self
            .tabs
            .write()
            .update_url(tab_id, url.clone(), title.clone())
            .is_some();
        if !updated {
            return;
        }

        self.persist(Partition::Tabs);
        self.record_visit(&title, &url, None);
    }

    pub fn current_tab(&self) -> Option<Tab> {
        self.tabs.read().current().cloned()
    }

    pub fn active_tabs(&self) -> Vec<Tab> {
        self.tabs.read().active_tabs().to_vec()
    }

    pub fn closed_tabs(&self) -> Vec<ClosedTab> {
        self.tabs.read().closed_tabs().to_vec()
    }

    // === History operations ===

    /// Record a page visit. Automatic recording is suppressed entirely
    /// when incognito mode is on or auto-save is off; this is the single
    /// enforcement point for that gate.
    pub fn record_visit(&self, title: &str, url: &str, favicon: Option<String>) {
        let (gated, max_items) = {
            let settings = self.settings.read();
            (
                !settings.auto_save_history || settings.incognito_mode,
                settings.max_history_items,
            )
        };

        if gated {
            tracing::debug!(url = %url, "History recording suppressed");
            return;
        }

        self.history.write().record(title, url, favicon, max_items);
        self.persist(Partition::History);
    }

    pub fn remove_history_entry(&self, id: &str) {
        if self.history.write().remove(id) {
            self.persist(Partition::History);
        }
    }

    pub fn clear_history(&self) {
        self.history.write().clear();
        self.persist(Partition::History);
    }

    pub fn search_history(&self, query: &str) -> Vec<HistoryEntry> {
        self.history.read().search(query)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.read().entries().to_vec()
    }

    // === Bookmark operations ===
    //
    // Bookmarks are explicit user actions and are never suppressed by
    // privacy mode.

    pub fn add_bookmark(
        &self,
        title: String,
        url: String,
        folder: String,
        tags: Vec<String>,
    ) -> String {
        let id = self.bookmarks.write().add(title, url, folder, tags);
        self.persist(Partition::Bookmarks);
        id
    }

    pub fn remove_bookmark(&self, id: &str) {
        if self.bookmarks.write().remove(id) {
            self.persist(Partition::Bookmarks);
        }
    }

    pub fn update_bookmark(&self, id: &str, patch: BookmarkPatch) {
        if self.bookmarks.write().update(id, patch) {
            self.persist(Partition::Bookmarks);
        }
    }

    pub fn search_bookmarks(&self, query: &str) -> Vec<BookmarkEntry> {
        self.bookmarks.read().search(query)
    }

    pub fn is_bookmarked(&self, url: &str) -> bool {
        self.bookmarks.read().is_bookmarked(url)
    }

    pub fn bookmarks(&self) -> Vec<BookmarkEntry> {
        self.bookmarks.read().entries().to_vec()
    }

    // === Download operations ===

    pub fn add_download(&self, name: String, url: String, size: u64, mime_type: String) -> String {
        let id = self.downloads.write().add(name, url, size, mime_type);
        self.persist(Partition::Downloads);
        id
    }

    pub fn start_download(&self, id: &str) {
        if self.downloads.write().start(id) {
            self.persist(Partition::Downloads);
        }
    }

    pub fn pause_download(&self, id: &str) {
        if self.downloads.write().pause(id) {
            self.persist(Partition::Downloads);
        }
    }

    pub fn resume_download(&self, id: &str) {
        if self.downloads.write().resume(id) {
            self.persist(Partition::Downloads);
        }
    }

    pub fn update_download(&self, id: &str, patch: DownloadPatch) {
        if self.downloads.write().update(id, patch) {
            self.persist(Partition::Downloads);
        }
    }

    pub fn update_download_progress(&self, id: &str, progress: u8) {
        self.downloads.write().set_progress(id, progress);
        self.persist(Partition::Downloads);
    }

    pub fn fail_download(&self, id: &str, message: &str) {
        if self.downloads.write().fail(id, message) {
            self.persist(Partition::Downloads);
        }
    }

    pub fn remove_download(&self, id: &str) {
        if self.downloads.write().remove(id) {
            self.persist(Partition::Downloads);
        }
    }

    pub fn clear_downloads(&self) {
        self.downloads.write().clear();
        self.persist(Partition::Downloads);
    }

    pub fn downloads(&self) -> Vec<DownloadRecord> {
        self.downloads.read().records().to_vec()
    }

    // === Settings ===

    pub fn update_settings(&self, patch: SettingsPatch) {
        {
            let mut settings = self.settings.write();
            patch.apply(&mut settings);
            self.resolver.write().set_engine(&settings.search_engine);
        }
        self.persist(Partition::Settings);
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    // === Rendering surface events ===

    pub fn resolve_input(&self, input: &str) -> InputResolution {
        self.resolver.read().resolve(input)
    }

    /// A navigation snapshot from the rendering surface. Page-load
    /// completion updates the current tab and records the visit.
    pub fn handle_navigation(&self, snapshot: &NavigationSnapshot) {
        if snapshot.loading || snapshot.url.is_empty() {
            return;
        }

        let title = if snapshot.title.trim().is_empty() {
            title_for_url(&snapshot.url)
        } else {
            snapshot.title.clone()
        };

        let current = self.tabs.read().current().map(|t| t.id.clone());
        if let Some(tab_id) = current {
            self.tabs
                .write()
                .update_url(&tab_id, snapshot.url.clone(), title.clone());
            self.persist(Partition::Tabs);
        }

        self.record_visit(&title, &snapshot.url, None);
    }

    /// Write every dirty partition immediately.
    pub fn flush(&self) {
        self.scheduler.flush();
    }

    // === Internals ===

    /// Load one partition; failures of any kind degrade to the empty
    /// value, since in-memory state is authoritative.
    fn load_partition<T: DeserializeOwned + Default>(&self, partition: Partition) -> T {
        match self.store.load(partition) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(partition = %partition, error = %e, "Partition failed to decode; starting empty");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(partition = %partition, error = %e, "Partition failed to load; starting empty");
                T::default()
            }
        }
    }

    /// Snapshot a partition's current state and hand it to the debounced
    /// scheduler. Serialization failures are logged, never surfaced.
    fn persist(&self, partition: Partition) {
        let snapshot = match partition {
            Partition::Settings => serde_json::to_value(self.settings.read().clone()),
            Partition::Tabs => serde_json::to_value(self.tabs.read().snapshot()),
            Partition::History => serde_json::to_value(self.history.read().entries()),
            Partition::Bookmarks => serde_json::to_value(self.bookmarks.read().entries()),
            Partition::Downloads => serde_json::to_value(self.downloads.read().records()),
        };

        match snapshot {
            Ok(value) => self.scheduler.schedule(partition, value),
            Err(e) => {
                tracing::warn!(partition = %partition, error = %e, "Partition snapshot failed to serialize");
            }
        }
    }
}

impl Clone for Browser {
    fn clone(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            tabs: Arc::clone(&self.tabs),
            history: Arc::clone(&self.history),
            bookmarks: Arc::clone(&self.bookmarks),
            downloads: Arc::clone(&self.downloads),
            resolver: Arc::clone(&self.resolver),
            cache: Arc::clone(&self.cache),
            store: Arc::clone(&self.store),
            scheduler: Arc::clone(&self.scheduler),
            initialized: Arc::clone(&self.initialized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_storage::MemoryStore;

    fn browser_with(store: Arc<MemoryStore>) -> Browser {
        let browser = Browser::with_debounce(
            store,
            Arc::new(CacheStore::default()),
            Duration::from_millis(5),
        );
        browser.initialize();
        browser
    }

    fn browser() -> Browser {
        browser_with(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_initialize_creates_default_tab_once() {
        let browser = browser();
        assert_eq!(browser.active_tabs().len(), 1);
        assert_eq!(browser.active_tabs()[0].url, "https://www.google.com");

        browser.initialize();
        assert_eq!(browser.active_tabs().len(), 1);
    }

    #[test]
    fn test_navigation_scenario() {
        let browser = browser();

        let id = browser.create_tab(None);
        browser.update_tab_url(&id, "example.com", None);

        let tab = browser.current_tab().unwrap();
        assert_eq!(tab.url, "https://example.com");
        assert_eq!(tab.title, "Example");

        let history = browser.history();
        assert_eq!(history[0].url, "https://example.com");
        assert_eq!(history[0].visit_count, 1);

        browser.record_visit("Example", "https://example.com", None);
        assert_eq!(browser.history()[0].visit_count, 2);
    }

    #[test]
    fn test_search_input_becomes_engine_query() {
        let browser = browser();
        browser.update_settings(SettingsPatch {
            search_engine: Some("duckduckgo".to_string()),
            ..Default::default()
        });

        let id = browser.create_tab(Some("rust borrow checker"));
        let tab = browser
            .active_tabs()
            .into_iter()
            .find(|t| t.id == id)
            .unwrap();
        assert_eq!(tab.url, "https://duckduckgo.com/?q=rust%20borrow%20checker");
    }

    #[test]
    fn test_privacy_gate_suppresses_history_only() {
        let browser = browser();
        browser.update_settings(SettingsPatch {
            incognito_mode: Some(true),
            ..Default::default()
        });

        browser.record_visit("Secret", "https://secret.example", None);
        browser.record_visit("Secret", "https://secret.example", None);
        assert!(browser.history().is_empty());

        // Explicit user actions are never gated
        browser.add_bookmark(
            "Secret".into(),
            "https://secret.example".into(),
            "Misc".into(),
            vec![],
        );
        let download = browser.add_download(
            "f.bin".into(),
            "https://secret.example/f.bin".into(),
            10,
            "application/octet-stream".into(),
        );
        assert_eq!(browser.bookmarks().len(), 1);
        assert!(browser.downloads().iter().any(|d| d.id == download));

        browser.update_settings(SettingsPatch {
            incognito_mode: Some(false),
            ..Default::default()
        });
        browser.record_visit("Public", "https://public.example", None);
        assert_eq!(browser.history().len(), 1);
    }

    #[test]
    fn test_auto_save_history_off_suppresses() {
        let browser = browser();
        browser.update_settings(SettingsPatch {
            auto_save_history: Some(false),
            ..Default::default()
        });

        browser.record_visit("A", "https://a.com", None);
        assert!(browser.history().is_empty());
    }

    #[test]
    fn test_close_and_restore_keeps_current_consistent() {
        let browser = browser();
        let first = browser.active_tabs()[0].id.clone();
        let second = browser.create_tab(Some("https://b.example"));

        browser.close_tab(&second);
        assert_eq!(browser.current_tab().unwrap().id, first);

        browser.restore_tab(&second);
        assert_eq!(browser.current_tab().unwrap().id, second);

        let active: Vec<String> = browser.active_tabs().iter().map(|t| t.id.clone()).collect();
        let closed: Vec<String> = browser.closed_tabs().iter().map(|t| t.id.clone()).collect();
        assert!(active.contains(&second));
        assert!(closed.is_empty());
    }

    #[test]
    fn test_state_survives_restart() {
        let store = Arc::new(MemoryStore::new());

        {
            let browser = browser_with(store.clone());
            browser.create_tab(Some("https://kept.example"));
            browser.record_visit("Kept", "https://kept.example", None);
            browser.add_bookmark(
                "Kept".into(),
                "https://kept.example".into(),
                "Misc".into(),
                vec!["tag".into()],
            );
            browser.update_settings(SettingsPatch {
                dark_mode: Some(true),
                ..Default::default()
            });
            browser.flush();
        }

        let reopened = browser_with(store);
        assert!(reopened.settings().dark_mode);
        assert_eq!(reopened.history().len(), 1);
        assert_eq!(reopened.bookmarks().len(), 1);
        assert!(reopened
            .active_tabs()
            .iter()
            .any(|t| t.url == "https://kept.example"));
        // No duplicate default tab on a restored profile
        assert_eq!(
            reopened
                .active_tabs()
                .iter()
                .filter(|t| t.url == "https://www.google.com")
                .count(),
            1
        );
    }

    #[test]
    fn test_handle_navigation_records_and_updates_tab() {
        let browser = browser();

        browser.handle_navigation(&NavigationSnapshot {
            url: "https://docs.example/page".to_string(),
            title: "Docs".to_string(),
            loading: true,
            can_go_back: false,
            can_go_forward: false,
        });
        // Still loading: nothing recorded
        assert!(browser.history().is_empty());

        browser.handle_navigation(&NavigationSnapshot {
            url: "https://docs.example/page".to_string(),
            title: "Docs".to_string(),
            loading: false,
            can_go_back: true,
            can_go_forward: false,
        });

        assert_eq!(browser.current_tab().unwrap().title, "Docs");
        assert_eq!(browser.history()[0].url, "https://docs.example/page");
    }

    #[test]
    fn test_corrupt_partition_degrades_to_empty() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(Partition::History, &serde_json::json!({"not": "a list"}))
            .unwrap();

        let browser = browser_with(store);
        assert!(browser.history().is_empty());
        assert_eq!(browser.active_tabs().len(), 1);
    }
}
