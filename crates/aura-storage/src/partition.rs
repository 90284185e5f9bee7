//! Partition names and the store contract

use crate::Result;
use serde_json::Value;

/// The five independently persisted subtrees of browsing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Settings,
    Tabs,
    History,
    Bookmarks,
    Downloads,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Settings => "settings",
            Partition::Tabs => "tabs",
            Partition::History => "history",
            Partition::Bookmarks => "bookmarks",
            Partition::Downloads => "downloads",
        }
    }

    pub const ALL: [Partition; 5] = [
        Partition::Settings,
        Partition::Tabs,
        Partition::History,
        Partition::Bookmarks,
        Partition::Downloads,
    ];
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend contract for durable partition storage.
///
/// `save` replaces the whole partition document atomically. A missing
/// partition on `load` is `Ok(None)`, which callers treat as empty.
pub trait PartitionStore: Send + Sync {
    fn load(&self, partition: Partition) -> Result<Option<Value>>;
    fn save(&self, partition: Partition, value: &Value) -> Result<()>;
}
