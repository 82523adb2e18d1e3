//! Freshness cache service
//!
//! One in-memory TTL cache shared process-wide across every data source.
//! Keys are namespaced strings ("weather", "news", "canvas:<token>") so
//! logically distinct sources cannot collide, credential-scoped results
//! included. Entries are never evicted; a stale entry is superseded by
//! the next successful fetch. Concurrent fetch-then-set on the same key
//! is last-write-wins, which is acceptable because values are idempotent
//! re-fetches.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default TTL in seconds (5 minutes)
pub const DEFAULT_TTL_SECS: i64 = 300;

/// A cached payload plus the unix second it was stored
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    stored_at: i64,
}

/// TTL-keyed store shared across data sources.
///
/// Constructed once at startup and passed by reference to the
/// aggregation service; there is no global instance.
pub struct FreshnessCache {
    ttl_secs: i64,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl FreshnessCache {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl_secs,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the payload for `key` if it is still fresh
    /// (`now - stored_at < ttl`). Stale and missing keys both return
    /// `None`; nothing is evicted.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, unix_now())
    }

    /// Return the payload for `key` regardless of freshness.
    ///
    /// Fallback path for when a re-fetch fails outright: a stale answer
    /// beats no answer.
    pub fn get_stale(&self, key: &str) -> Option<Value> {
        let entries = self.lock();
        entries.get(key).map(|e| e.payload.clone())
    }

    /// Store `payload` under `key`, superseding any previous entry.
    pub fn set(&self, key: &str, payload: Value) {
        self.set_at(key, payload, unix_now());
    }

    pub(crate) fn get_at(&self, key: &str, now: i64) -> Option<Value> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        if now - entry.stored_at < self.ttl_secs {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    pub(crate) fn set_at(&self, key: &str, payload: Value, now: i64) {
        let mut entries = self.lock();
        entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                stored_at: now,
            },
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself is still usable under last-write-wins semantics.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for FreshnessCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
