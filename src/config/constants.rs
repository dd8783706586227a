// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Well-known endpoints and default tuning values
//!
//! This module centralizes magic constants used throughout the paymentscan
//! crate, so the defaults of [`PaymentScanConfig`](super::PaymentScanConfig)
//! are discoverable in one place.

use std::time::Duration;

/// Horizon endpoints operated by the Stellar Development Foundation
pub mod horizon {
    /// Public network (mainnet) Horizon
    pub const PUBLIC_URL: &str = "https://horizon.stellar.org";

    /// Testnet Horizon
    pub const TESTNET_URL: &str = "https://horizon-testnet.stellar.org";

    /// Largest `limit` Horizon accepts on collection endpoints
    pub const MAX_PAGE_LIMIT: u32 = 200;
}

/// Page size used when the caller does not supply one
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum number of cached query results
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 500;

/// Sliding time-to-live for cached query results
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Maximum number of keys tracked by the backoff gate
pub const DEFAULT_BACKOFF_MAX_ENTRIES: usize = 1000;

/// How long failure history for a key is retained
pub const DEFAULT_BACKOFF_RETENTION: Duration = Duration::from_secs(5 * 60);

/// Total upstream attempts per call (initial request included)
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound for a single backoff delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Memo lookups allowed in flight at once while normalizing a page
pub const DEFAULT_MEMO_CONCURRENCY: usize = 8;

/// Timeout for a single HTTP request against Horizon
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_retention_outlives_cache_ttl() {
        assert!(DEFAULT_BACKOFF_RETENTION > DEFAULT_CACHE_TTL);
    }

    #[test]
    fn test_default_page_size_within_horizon_limit() {
        assert!(DEFAULT_PAGE_SIZE <= horizon::MAX_PAGE_LIMIT);
    }
}
