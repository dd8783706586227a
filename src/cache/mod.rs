// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Result cache for normalized payment pages
//!
//! [`QueryCache`] is a bounded in-memory store keyed by [`CacheKey`](crate::CacheKey):
//!
//! - Sliding TTL: a successful read refreshes the entry's age
//! - LRU eviction once the configured capacity is reached
//! - Binary expiry, an entry is either fresh or gone
//!
//! # Examples
//!
//! ```rust
//! use paymentscan::{CacheKey, Network, Query, QueryCache, QueryResult};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = QueryCache::new(500, Duration::from_secs(30));
//! let key = CacheKey::new(Network::Testnet, &Query::new("GABC"));
//!
//! assert!(cache.get(&key).await.is_none());
//! cache.put(key.clone(), QueryResult::default()).await;
//! assert!(cache.get(&key).await.is_some());
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use serde::Serialize;

mod memory;

pub use memory::QueryCache;

/// Statistics about cache contents and performance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub entries: usize,
    /// Configured capacity
    pub max_entries: usize,
    /// Configured sliding TTL
    pub ttl: Duration,
    /// Number of cache hits (successful retrievals)
    pub hits: u64,
    /// Number of cache misses (absent or expired)
    pub misses: u64,
    /// Number of entries evicted due to size limits
    pub evictions: u64,
    /// Number of entries expired due to TTL
    pub expirations: u64,
}

impl CacheStats {
    /// Calculates the cache hit rate as a percentage (0.0 to 100.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entries={}/{}, ttl={}ms, hits={}, misses={}, evictions={}, expirations={}, hit_rate={:.1}%",
            self.entries,
            self.max_entries,
            self.ttl.as_millis(),
            self.hits,
            self.misses,
            self.evictions,
            self.expirations,
            self.hit_rate()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_display() {
        let stats = CacheStats {
            entries: 2,
            max_entries: 10,
            ttl: Duration::from_secs(30),
            hits: 3,
            misses: 1,
            evictions: 0,
            expirations: 0,
        };
        assert_eq!(
            stats.to_string(),
            "entries=2/10, ttl=30000ms, hits=3, misses=1, evictions=0, expirations=0, hit_rate=75.0%"
        );
    }
}
