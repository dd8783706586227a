// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory result cache with sliding TTL and LRU eviction

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::CacheStats;
use crate::types::cache::AccessSequence;
use crate::types::payment::QueryResult;
use crate::types::query::CacheKey;

/// Entry in the result cache with metadata
#[derive(Debug, Clone)]
struct CacheEntry {
    value: QueryResult,
    /// When this entry was stored
    inserted_at: Instant,
    /// When this entry was last stored or read; drives both expiry and LRU
    last_accessed: Instant,
    /// Sequence number for deterministic LRU ordering when instants are equal
    access_seq: AccessSequence,
}

impl CacheEntry {
    fn new(value: QueryResult, access_seq: AccessSequence) -> Self {
        let now = Instant::now();
        Self {
            value,
            inserted_at: now,
            last_accessed: now,
            access_seq,
        }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_accessed) > ttl
    }

    fn touch(&mut self, now: Instant, access_seq: AccessSequence) {
        self.last_accessed = now;
        self.access_seq = access_seq;
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
    next_seq: AccessSequence,
}

impl CacheState {
    /// Evicts the least recently used entry
    fn evict_lru(&mut self) {
        let lru_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.last_accessed, entry.access_seq))
            .map(|(key, _)| key.clone());

        if let Some(key) = lru_key {
            debug!(key = %key, "Evicting LRU cache entry");
            self.entries.remove(&key);
            self.evictions += 1;
        }
    }
}

/// Bounded cache of normalized query results
///
/// Entries expire once they have not been stored or read for longer than the
/// TTL; every hit refreshes the entry. When the cache is full, inserting a new
/// key evicts the least recently used entry first.
///
/// All state sits behind one async mutex; callers never hold references into
/// it, results are returned by value.
///
/// # Performance
///
/// - Get: O(1) average case (HashMap lookup)
/// - Put: O(1) without eviction, O(n) with eviction (finds LRU)
#[derive(Debug)]
pub struct QueryCache {
    max_entries: usize,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl QueryCache {
    /// Creates a cache holding at most `max_entries` results for `ttl` each
    ///
    /// A capacity of zero is treated as one.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            max_entries: max_entries.max(1),
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the cached result for `key` if present and fresh
    ///
    /// A hit refreshes the entry's age. An expired entry is removed and
    /// counted as a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<QueryResult> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = Instant::now();
        let seq = state.next_seq;

        let expired = match state.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(self.ttl, now) => {
                entry.touch(now, seq);
                let value = entry.value.clone();
                state.next_seq = seq.next();
                state.hits += 1;
                debug!(key = %key, "Cache hit");
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            state.entries.remove(key);
            state.expirations += 1;
            debug!(key = %key, "Cache entry expired");
        } else {
            debug!(key = %key, "Cache miss");
        }
        state.misses += 1;
        None
    }

    /// Stores `value` under `key`, evicting the LRU entry if at capacity
    ///
    /// Replacing an existing key never evicts another entry.
    pub async fn put(&self, key: CacheKey, value: QueryResult) {
        let mut state = self.state.lock().await;

        if !state.entries.contains_key(&key) {
            while state.entries.len() >= self.max_entries {
                state.evict_lru();
            }
        }

        debug!(key = %key, items = value.items.len(), "Inserting entry into result cache");
        let seq = state.next_seq.advance();
        state.entries.insert(key, CacheEntry::new(value, seq));
    }

    /// Removes every entry; counters are kept
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        debug!(entries = state.entries.len(), "Clearing result cache");
        state.entries.clear();
    }

    /// Returns current cache statistics
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            entries: state.entries.len(),
            max_entries: self.max_entries,
            ttl: self.ttl,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            expirations: state.expirations,
        }
    }

    /// Age of the entry for `key` since it was stored, without touching it
    pub async fn entry_age(&self, key: &CacheKey) -> Option<Duration> {
        let state = self.state.lock().await;
        state
            .entries
            .get(key)
            .map(|entry| entry.inserted_at.elapsed())
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
