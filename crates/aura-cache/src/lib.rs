//! Aura Cache
//!
//! Bounded key→value cache used to memoize expensive derived queries
//! (history/bookmark search, site metadata). Entries carry a TTL and the
//! whole store is kept under a serialized-size budget by evicting the
//! oldest entries by creation time. The cache is never persisted; it is
//! rebuilt lazily and is correct to lose on restart.

mod store;

pub use store::{CacheStats, CacheStore, DEFAULT_MAX_SIZE, DEFAULT_TTL};
