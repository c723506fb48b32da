//! In-memory key/value store with per-entry TTL.
//!
//! Entries are checked for expiry on every read, so a skipped or delayed
//! background sweep can never hand out a stale value. The sweep only reclaims
//! memory. Nothing is persisted: a restart empties the cache.

use crate::clock::{Clock, system_clock};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Smallest TTL accepted by [`CacheStore::set`]; keeps `expires_at > created_at`.
pub const MIN_TTL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// An entry is logically absent from its expiry instant onwards.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
pub struct CacheStore<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> Default for CacheStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the live value for `key`, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(key)
            && !entry.is_expired(now)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.value.clone());
        }

        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Stores `value`, replacing any previous entry for `key`.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let created_at = self.clock.now();
        let ttl = chrono::Duration::from_std(ttl.max(MIN_TTL)).unwrap_or(chrono::Duration::MAX);
        let expires_at = created_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                value,
                created_at,
                expires_at,
            },
        );
    }

    pub fn exists(&self, key: &str) -> bool {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(key)
            && !entry.is_expired(now)
        {
            return true;
        }
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        false
    }

    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every key matching `pattern` and returns how many were removed.
    ///
    /// `*` matches any (possibly empty) substring; everything else matches
    /// literally and case-sensitively. The pattern must cover the whole key.
    pub fn delete_by_pattern(&self, pattern: &str) -> usize {
        let Some(matcher) = compile_glob(pattern) else {
            return 0;
        };

        let doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| matcher.is_match(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        doomed
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count()
    }

    /// Live keys matching `pattern`, sorted.
    pub fn keys_by_pattern(&self, pattern: &str) -> Vec<String> {
        let Some(matcher) = compile_glob(pattern) else {
            return Vec::new();
        };
        let now = self.clock.now();

        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.is_expired(now) && matcher.is_match(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn set_many(&self, items: impl IntoIterator<Item = (String, V, Duration)>) {
        for (key, value, ttl) in items {
            self.set(key, value, ttl);
        }
    }

    pub fn get_many<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> Vec<(String, Option<V>)> {
        keys.into_iter()
            .map(|key| (key.to_string(), self.get(key)))
            .collect()
    }

    pub fn delete_many<'a>(&self, keys: impl IntoIterator<Item = &'a str>) {
        for key in keys {
            self.delete(key);
        }
    }

    /// Evicts every expired entry and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            debug!("Cache cleanup: removed {} expired items", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let expired_entries = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired(now))
            .count();

        CacheStats {
            total_entries: self.entries.len(),
            expired_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Starts the periodic sweep. Abort the returned handle to stop it.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let every = every.max(MIN_TTL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                store.sweep();
            }
        })
    }
}

fn compile_glob(pattern: &str) -> Option<Regex> {
    let expression = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    match Regex::new(&expression) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Ignoring invalid cache key pattern '{}': {}", pattern, e);
            None
        }
    }
}
