// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Entry point for payment history queries
//!
//! [`PaymentQueryService`] owns the result cache and the backoff tracker and
//! serves each query in a fixed order:
//!
//! ```text
//! cache hit?      -> return the cached page
//! key throttled?  -> QueryError::Throttled { retry_after }
//! otherwise       -> FetchRetryEngine::execute
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use paymentscan::{Network, PaymentQueryService, PaymentScanConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = PaymentQueryService::horizon(PaymentScanConfig::for_network(Network::Public))?;
//!
//! let page = service.get_payments("GABC...", None, 20, None).await?;
//! for item in &page.items {
//!     println!("{} {} {}", item.timestamp, item.amount, item.asset);
//! }
//!
//! if let Some(cursor) = page.next_cursor.as_deref() {
//!     let older = service.get_payments("GABC...", None, 20, Some(cursor)).await?;
//!     println!("{} more", older.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, Instrument};

use crate::backoff::BackoffTracker;
use crate::cache::QueryCache;
use crate::config::{ConfigError, PaymentScanConfig};
use crate::errors::QueryError;
use crate::retry::FetchRetryEngine;
use crate::tracing::spans;
use crate::types::payment::QueryResult;
use crate::types::query::{CacheKey, Query};
use crate::upstream::{HorizonClient, LedgerSource};

/// Snapshot of the service's stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub cache_entries: usize,
    pub cache_max_entries: usize,
    pub cache_ttl_ms: u64,
    pub backoff_entries: usize,
}

/// Cached, throttled, retried access to an account's payment history
#[derive(Debug)]
pub struct PaymentQueryService {
    config: PaymentScanConfig,
    cache: Arc<QueryCache>,
    backoff: Arc<BackoffTracker>,
    engine: FetchRetryEngine,
}

impl PaymentQueryService {
    /// Creates a service over an arbitrary ledger source
    pub fn new(config: PaymentScanConfig, source: Arc<dyn LedgerSource>) -> Self {
        let cache = Arc::new(QueryCache::new(config.cache_max_entries, config.cache_ttl));
        let backoff = Arc::new(BackoffTracker::new(
            config.backoff_max_entries,
            config.backoff_retention,
            config.max_retries,
            config.base_delay,
            config.max_delay,
        ));
        let engine = FetchRetryEngine::new(
            config.network,
            source,
            Arc::clone(&cache),
            Arc::clone(&backoff),
            config.retry_policy(),
        );

        Self {
            config,
            cache,
            backoff,
            engine,
        }
    }

    /// Creates a service talking to Horizon
    ///
    /// The config is validated first.
    pub fn horizon(config: PaymentScanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = HorizonClient::from_config(&config)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &PaymentScanConfig {
        &self.config
    }

    /// Fetches one page of payments for `account_id`
    ///
    /// `page_size` is clamped to `1..=200`. Pass the previous page's
    /// `next_cursor` to continue with older payments.
    pub async fn get_payments(
        &self,
        account_id: &str,
        asset_filter: Option<&str>,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<QueryResult, QueryError> {
        let mut query = Query::new(account_id).with_page_size(page_size);
        if let Some(filter) = asset_filter {
            query = query.with_asset_filter(filter);
        }
        if let Some(cursor) = cursor {
            query = query.with_cursor(cursor);
        }
        self.query(&query).await
    }

    /// Serves a prepared [`Query`]
    pub async fn query(&self, query: &Query) -> Result<QueryResult, QueryError> {
        let span = spans::get_payments(
            self.config.network,
            query.account_id(),
            query.asset_filter(),
            query.page_size(),
            query.cursor(),
        );

        async move {
            let key = CacheKey::new(self.config.network, query);

            if let Some(result) = self.cache.get(&key).await {
                return Ok(result);
            }

            let status = self.backoff.is_blocked(&key).await;
            if status.blocked {
                info!(
                    key = %key,
                    retry_after_ms = status.retry_after.as_millis(),
                    "Rejecting throttled query"
                );
                return Err(QueryError::throttled(status.retry_after));
            }

            self.engine.execute(query).await
        }
        .instrument(span)
        .await
    }

    /// Current sizes of the cache and the backoff tracker
    pub async fn stats(&self) -> ServiceStats {
        let cache = self.cache.stats().await;
        ServiceStats {
            cache_entries: cache.entries,
            cache_max_entries: cache.max_entries,
            cache_ttl_ms: duration_ms(cache.ttl),
            backoff_entries: self.backoff.count().await,
        }
    }

    /// Empties the cache and forgets all failure history
    pub async fn clear_all(&self) {
        self.cache.clear().await;
        self.backoff.clear_all().await;
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::errors::UpstreamError;
    use crate::upstream::{OperationsRequest, RawOperation};

    struct EmptySource;

    #[async_trait]
    impl LedgerSource for EmptySource {
        async fn fetch_operations(
            &self,
            _request: &OperationsRequest,
        ) -> Result<Vec<RawOperation>, UpstreamError> {
            Ok(Vec::new())
        }

        async fn fetch_memo(&self, _tx_hash: &str) -> Result<Option<String>, UpstreamError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_stats_reflect_config() {
        let config = PaymentScanConfig {
            cache_max_entries: 42,
            cache_ttl: Duration::from_secs(15),
            ..PaymentScanConfig::default()
        };
        let service = PaymentQueryService::new(config, Arc::new(EmptySource));

        assert_eq!(
            service.stats().await,
            ServiceStats {
                cache_entries: 0,
                cache_max_entries: 42,
                cache_ttl_ms: 15_000,
                backoff_entries: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_empty_page_is_cached() {
        let service = PaymentQueryService::new(PaymentScanConfig::default(), Arc::new(EmptySource));

        let result = service.get_payments("GA", None, 20, None).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(result.next_cursor, None);
        assert_eq!(service.stats().await.cache_entries, 1);

        service.clear_all().await;
        assert_eq!(service.stats().await.cache_entries, 0);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = ServiceStats {
            cache_entries: 1,
            cache_max_entries: 500,
            cache_ttl_ms: 30_000,
            backoff_entries: 2,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["cache_ttl_ms"], 30_000);
        assert_eq!(json["backoff_entries"], 2);
    }

    #[test]
    fn test_horizon_rejects_invalid_config() {
        let config = PaymentScanConfig {
            max_retries: 0,
            ..PaymentScanConfig::default()
        };
        assert!(PaymentQueryService::horizon(config).is_err());
    }
}
