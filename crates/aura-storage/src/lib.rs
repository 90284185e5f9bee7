//! Aura Storage
//!
//! Durable partition store: named, independently loaded/saved JSON
//! documents that survive process restarts. Each partition is replaced
//! wholesale on save, never patched incrementally, so a crash between
//! mutation and flush can lose recent mutations but never corrupts state.

mod error;
mod memory;
mod migrations;
mod partition;
mod sqlite;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use partition::{Partition, PartitionStore};
pub use sqlite::SqliteStore;

pub type Result<T> = std::result::Result<T, StorageError>;
