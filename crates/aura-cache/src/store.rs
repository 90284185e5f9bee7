//! Bounded TTL cache store
//!
//! Eviction is purely creation-time based: reads never refresh an entry's
//! age. After every insert a cleanup pass runs; when the serialized size
//! of all entries exceeds the budget, the oldest entries are dropped until
//! usage falls to 80% of the budget so repeated near-budget writes do not
//! thrash.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default size budget: 50 MiB of serialized entries.
pub const DEFAULT_MAX_SIZE: usize = 50 * 1024 * 1024;

/// Default entry TTL: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Fraction of the budget to shrink to when over budget.
const CLEANUP_TARGET: f64 = 0.8;

struct Entry {
    /// Serialized JSON payload; its byte length is the entry's size.
    payload: String,
    created_at: Instant,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Diagnostic counters for the cache. Informational only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub total_size: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub max_size: usize,
    pub usage_percentage: f64,
}

pub struct CacheStore {
    entries: Mutex<HashMap<String, Entry>>,
    max_size: usize,
    default_ttl: Duration,
}

impl CacheStore {
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_size,
            default_ttl,
        }
    }

    /// Store a value under `key`. Serialization failures are swallowed and
    /// logged; the cache is a best-effort layer and must never surface a
    /// user-visible failure.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache set failed to serialize");
                return;
            }
        };

        let now = Instant::now();
        let entry = Entry {
            payload,
            created_at: now,
            expires_at: now + ttl.unwrap_or(self.default_ttl),
        };

        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), entry);
        Self::cleanup(&mut entries, self.max_size);
    }

    /// Fetch a value. Returns `None` (and reaps the entry) if it has
    /// expired. Reading does not refresh the entry's age.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return None,
        };

        if expired {
            entries.remove(key);
            return None;
        }

        let entry = entries.get(key)?;
        match serde_json::from_str(&entry.payload) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache entry failed to deserialize");
                entries.remove(key);
                None
            }
        }
    }

    pub fn delete(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Drop every entry whose key starts with `prefix`. Used to invalidate
    /// a memoized query namespace after the underlying index mutates.
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries.lock().retain(|key, _| !key.starts_with(prefix));
    }

    /// Evict oldest-by-creation entries until total size is at most 80% of
    /// the budget. Runs after every insert.
    fn cleanup(entries: &mut HashMap<String, Entry>, max_size: usize) {
        let mut total: usize = entries.values().map(|e| e.payload.len()).sum();
        if total <= max_size {
            return;
        }

        let target = (max_size as f64 * CLEANUP_TARGET) as usize;

        let mut by_age: Vec<(String, Instant, usize)> = entries
            .iter()
            .map(|(k, e)| (k.clone(), e.created_at, e.payload.len()))
            .collect();
        by_age.sort_by_key(|(_, created_at, _)| *created_at);

        let mut evicted = 0usize;
        for (key, _, size) in by_age {
            if total <= target {
                break;
            }
            entries.remove(&key);
            total -= size;
            evicted += 1;
        }

        tracing::debug!(
            evicted,
            remaining = entries.len(),
            total_size = total,
            "Cache cleanup pass"
        );
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.lock();

        let mut total_size = 0usize;
        let mut valid_entries = 0usize;
        let mut expired_entries = 0usize;

        for entry in entries.values() {
            total_size += entry.payload.len();
            if entry.is_expired(now) {
                expired_entries += 1;
            } else {
                valid_entries += 1;
            }
        }

        CacheStats {
            total_size,
            valid_entries,
            expired_entries,
            max_size: self.max_size,
            usage_percentage: total_size as f64 / self.max_size as f64 * 100.0,
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cache = CacheStore::default();
        cache.set("k", &vec!["a".to_string(), "b".to_string()], None);

        let value: Option<Vec<String>> = cache.get("k");
        assert_eq!(value, Some(vec!["a".to_string(), "b".to_string()]));

        let missing: Option<Vec<String>> = cache.get("absent");
        assert!(missing.is_none());
    }

    #[test]
    fn test_expiry() {
        let cache = CacheStore::default();
        cache.set("k", &42u32, Some(Duration::from_millis(10)));

        std::thread::sleep(Duration::from_millis(20));

        let value: Option<u32> = cache.get("k");
        assert!(value.is_none());
        assert_eq!(cache.stats().valid_entries, 0);
    }

    #[test]
    fn test_budget_eviction() {
        // Each entry serializes to well over 40 bytes; budget fits two.
        let cache = CacheStore::new(120, DEFAULT_TTL);

        cache.set("a", &"x".repeat(50), None);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("b", &"y".repeat(50), None);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("c", &"z".repeat(50), None);

        let stats = cache.stats();
        assert!(stats.total_size <= 120);

        // Oldest entry went first.
        let a: Option<String> = cache.get("a");
        assert!(a.is_none());
        let c: Option<String> = cache.get("c");
        assert!(c.is_some());
    }

    #[test]
    fn test_read_does_not_refresh_age() {
        let cache = CacheStore::new(120, DEFAULT_TTL);

        cache.set("a", &"x".repeat(50), None);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("b", &"y".repeat(50), None);

        // Hammering the oldest entry must not protect it from eviction.
        for _ in 0..10 {
            let _: Option<String> = cache.get("a");
        }

        std::thread::sleep(Duration::from_millis(2));
        cache.set("c", &"z".repeat(50), None);

        let a: Option<String> = cache.get("a");
        assert!(a.is_none());
    }

    #[test]
    fn test_invalidate_prefix() {
        let cache = CacheStore::default();
        cache.set("history:search:rust", &1u32, None);
        cache.set("history:search:cat", &2u32, None);
        cache.set("bookmarks:search:rust", &3u32, None);

        cache.invalidate_prefix("history:search:");

        let h: Option<u32> = cache.get("history:search:rust");
        assert!(h.is_none());
        let b: Option<u32> = cache.get("bookmarks:search:rust");
        assert_eq!(b, Some(3));
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = CacheStore::default();
        cache.set("a", &1u32, None);
        cache.set("b", &2u32, None);

        cache.delete("a");
        let a: Option<u32> = cache.get("a");
        assert!(a.is_none());

        cache.clear();
        assert_eq!(cache.stats().valid_entries, 0);
        assert_eq!(cache.stats().total_size, 0);
    }
}
