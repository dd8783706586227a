// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Per-key failure tracking for cross-request admission control
//!
//! The [`BackoffTracker`] remembers how many times fetching a key has failed
//! and when the last failure happened. Before a request reaches upstream, the
//! service asks the tracker whether the key is still cooling down:
//!
//! ```text
//! required_delay = min(base_delay * 2^(attempts - 1), max_delay)
//! blocked        = now - last_attempt_at < required_delay
//! ```
//!
//! The gate check is deterministic (no jitter), so repeated checks inside the
//! same window agree. History is only erased by [`BackoffTracker::clear`]
//! after a successful fetch, or when it outlives the retention period.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::retry::exponential_delay;
use crate::types::cache::AccessSequence;
use crate::types::query::CacheKey;

/// Outcome of a gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffStatus {
    /// Whether the key is still cooling down
    pub blocked: bool,
    /// Remaining cool-down; zero when not blocked
    pub retry_after: Duration,
}

impl BackoffStatus {
    const OPEN: Self = Self {
        blocked: false,
        retry_after: Duration::ZERO,
    };
}

#[derive(Debug, Clone)]
struct BackoffEntry {
    /// Failures recorded since the last success, capped at `max_attempts`
    attempts: u32,
    last_attempt_at: Instant,
    access_seq: AccessSequence,
}

#[derive(Debug, Default)]
struct BackoffState {
    entries: HashMap<CacheKey, BackoffEntry>,
    next_seq: AccessSequence,
}

impl BackoffState {
    /// Drops every entry whose last failure is older than `retention`
    fn prune_expired(&mut self, now: Instant, retention: Duration) {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.last_attempt_at) <= retention);
        let pruned = before - self.entries.len();
        if pruned > 0 {
            debug!(pruned, "Dropped backoff entries past retention");
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.last_attempt_at, entry.access_seq))
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            debug!(key = %key, "Evicting oldest backoff entry");
            self.entries.remove(&key);
        }
    }
}

/// Bounded store of per-key failure history
///
/// Capacity and retention are independent of the result cache. Retention is
/// usually longer, so callers that keep failing stay throttled even after a
/// cached result would have expired.
#[derive(Debug)]
pub struct BackoffTracker {
    max_entries: usize,
    retention: Duration,
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    state: Mutex<BackoffState>,
}

impl BackoffTracker {
    /// Creates a tracker
    ///
    /// * `max_entries` - keys tracked before the stalest is evicted (min 1)
    /// * `retention` - how long failure history is kept after the last failure
    /// * `max_attempts` - cap for the per-key attempt counter (min 1)
    /// * `base_delay`, `max_delay` - exponential cool-down parameters
    pub fn new(
        max_entries: usize,
        retention: Duration,
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_entries: max_entries.max(1),
            retention,
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            state: Mutex::new(BackoffState::default()),
        }
    }

    /// Checks whether `key` is cooling down
    ///
    /// Never erases history for keys that are no longer blocked; only entries
    /// older than the retention period are dropped.
    pub async fn is_blocked(&self, key: &CacheKey) -> BackoffStatus {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let Some((attempts, last_attempt_at)) = state
            .entries
            .get(key)
            .map(|entry| (entry.attempts, entry.last_attempt_at))
        else {
            return BackoffStatus::OPEN;
        };

        let elapsed = now.saturating_duration_since(last_attempt_at);
        if elapsed > self.retention {
            debug!(key = %key, "Backoff entry outlived retention");
            state.entries.remove(key);
            return BackoffStatus::OPEN;
        }

        let required = self.required_delay(attempts);
        if elapsed < required {
            BackoffStatus {
                blocked: true,
                retry_after: required - elapsed,
            }
        } else {
            BackoffStatus::OPEN
        }
    }

    /// Records a failed attempt for `key`
    ///
    /// Creates the entry on first failure, otherwise increments the attempt
    /// counter (capped) and restamps the last attempt.
    pub async fn record_failure(&self, key: &CacheKey) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = Instant::now();
        let seq = state.next_seq.advance();

        // Stale history starts over
        let stale = state
            .entries
            .get(key)
            .is_some_and(|entry| now.saturating_duration_since(entry.last_attempt_at) > self.retention);
        if stale {
            state.entries.remove(key);
        }

        if let Some(entry) = state.entries.get_mut(key) {
            entry.attempts = entry.attempts.saturating_add(1).min(self.max_attempts);
            entry.last_attempt_at = now;
            entry.access_seq = seq;
            debug!(key = %key, attempts = entry.attempts, "Recorded upstream failure");
            return;
        }

        if state.entries.len() >= self.max_entries {
            state.prune_expired(now, self.retention);
        }
        while state.entries.len() >= self.max_entries {
            state.evict_oldest();
        }
        state.entries.insert(
            key.clone(),
            BackoffEntry {
                attempts: 1,
                last_attempt_at: now,
                access_seq: seq,
            },
        );
        debug!(key = %key, attempts = 1, "Recorded upstream failure");
    }

    /// Forgets the failure history of `key`
    pub async fn clear(&self, key: &CacheKey) {
        let mut state = self.state.lock().await;
        if state.entries.remove(key).is_some() {
            debug!(key = %key, "Cleared backoff entry");
        }
    }

    /// Forgets all failure history
    pub async fn clear_all(&self) {
        let mut state = self.state.lock().await;
        debug!(entries = state.entries.len(), "Clearing backoff tracker");
        state.entries.clear();
    }

    /// Number of keys with failure history still within retention
    pub async fn count(&self) -> usize {
        let mut state = self.state.lock().await;
        state.prune_expired(Instant::now(), self.retention);
        state.entries.len()
    }

    /// Recorded attempts for `key`, if any within retention
    pub async fn attempts(&self, key: &CacheKey) -> Option<u32> {
        let now = Instant::now();
        self.state
            .lock()
            .await
            .entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.last_attempt_at) <= self.retention)
            .map(|entry| entry.attempts)
    }

    fn required_delay(&self, attempts: u32) -> Duration {
        exponential_delay(attempts, self.base_delay, self.max_delay)
    }
}
