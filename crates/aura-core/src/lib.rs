//! Aura Core
//!
//! Session orchestration layer for the Aura browser. Owns the composed
//! browsing state (tabs, history, bookmarks, downloads, settings) and is
//! the only writer to the partition store; the rendering surface is
//! stateless and reports events here.

mod bookmarks;
mod browser;
mod error;
mod persist;
mod settings;

pub use bookmarks::{BookmarkEntry, BookmarkIndex, BookmarkPatch};
pub use browser::{Browser, NavigationSnapshot};
pub use error::CoreError;
pub use persist::{PersistScheduler, DEFAULT_DEBOUNCE};
pub use settings::{Settings, SettingsPatch};

// Re-export core components
pub use aura_cache::{CacheStats, CacheStore};
pub use aura_download::{
    format_size, sanitize_file_name, DownloadLedger, DownloadPatch, DownloadRecord, DownloadStatus,
};
pub use aura_navigation::{
    title_for_url, HistoryEntry, HistoryIndex, InputResolution, InputResolver, SearchEngine,
};
pub use aura_storage::{MemoryStore, Partition, PartitionStore, SqliteStore, StorageError};
pub use aura_tabs::{ClosedTab, Tab, TabManager, TabsSnapshot};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
