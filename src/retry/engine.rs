// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tracing::{debug, warn, Instrument};

use super::RetryPolicy;
use crate::backoff::BackoffTracker;
use crate::cache::QueryCache;
use crate::config::Network;
use crate::errors::QueryError;
use crate::normalize::Normalizer;
use crate::tracing::spans;
use crate::types::payment::QueryResult;
use crate::types::query::{CacheKey, Query};
use crate::upstream::{LedgerSource, OperationsRequest};

/// Fetches one page from upstream with bounded retries
///
/// The stores are shared with the service that owns the engine; the engine
/// only writes to them on the outcomes described in the module docs.
pub struct FetchRetryEngine {
    network: Network,
    source: Arc<dyn LedgerSource>,
    normalizer: Normalizer,
    cache: Arc<QueryCache>,
    backoff: Arc<BackoffTracker>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for FetchRetryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchRetryEngine")
            .field("network", &self.network)
            .field("source", &self.source.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl FetchRetryEngine {
    pub fn new(
        network: Network,
        source: Arc<dyn LedgerSource>,
        cache: Arc<QueryCache>,
        backoff: Arc<BackoffTracker>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            network,
            normalizer: Normalizer::new(Arc::clone(&source)),
            source,
            cache,
            backoff,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `query` against upstream until it succeeds, fails permanently, or
    /// the attempt budget is exhausted
    pub async fn execute(&self, query: &Query) -> Result<QueryResult, QueryError> {
        let key = CacheKey::new(self.network, query);
        let request = OperationsRequest::from(query);
        let max_retries = self.policy.max_retries();

        let mut attempt = 1u32;
        loop {
            let span = spans::fetch_page(query.account_id(), attempt, max_retries);

            match self
                .source
                .fetch_operations(&request)
                .instrument(span.clone())
                .await
            {
                Ok(records) => {
                    if attempt > 1 {
                        debug!(attempt = attempt, "Request succeeded after retry");
                    }
                    let result = self
                        .normalizer
                        .normalize(records, query.asset_filter())
                        .instrument(span)
                        .await;

                    self.backoff.clear(&key).await;
                    self.cache.put(key, result.clone()).await;
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_retryable() {
                        debug!(
                            error = %error,
                            "Non-retryable error, not retrying"
                        );
                        return Err(QueryError::from_upstream(error));
                    }

                    self.backoff.record_failure(&key).await;

                    if attempt >= max_retries {
                        warn!(
                            error = %error,
                            attempts = attempt,
                            "Max retries exceeded"
                        );
                        return Err(QueryError::from_upstream(error));
                    }

                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        error = %error,
                        attempt = attempt,
                        max_retries = max_retries,
                        delay_ms = delay.as_millis(),
                        "Retryable error, backing off"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;

    use super::*;
    use crate::errors::{ErrorKind, UpstreamError};
    use crate::retry::Jitter;
    use crate::upstream::RawOperation;

    /// Answers from a script; once the script runs out, every call succeeds
    /// with an empty page
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<RawOperation>, u16>>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<RawOperation>, u16>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LedgerSource for ScriptedSource {
        async fn fetch_operations(
            &self,
            _request: &OperationsRequest,
        ) -> Result<Vec<RawOperation>, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().await.pop_front() {
                Some(Ok(records)) => Ok(records),
                Some(Err(status)) => Err(UpstreamError::status(status, "fetch operations")),
                None => Ok(Vec::new()),
            }
        }

        async fn fetch_memo(&self, _tx_hash: &str) -> Result<Option<String>, UpstreamError> {
            Ok(None)
        }
    }

    fn payment(id: &str) -> RawOperation {
        RawOperation {
            id: id.to_string(),
            paging_token: id.to_string(),
            operation_type: "payment".to_string(),
            created_at: Utc::now(),
            transaction_hash: format!("tx{id}"),
            amount: Some("1.0000000".to_string()),
            asset_type: Some("native".to_string()),
            asset_code: None,
            asset_issuer: None,
            from: None,
            to: None,
        }
    }

    struct Fixture {
        source: Arc<ScriptedSource>,
        cache: Arc<QueryCache>,
        backoff: Arc<BackoffTracker>,
        engine: FetchRetryEngine,
    }

    fn fixture(script: Vec<Result<Vec<RawOperation>, u16>>) -> Fixture {
        let source = ScriptedSource::new(script);
        let cache = Arc::new(QueryCache::new(10, Duration::from_secs(30)));
        let backoff = Arc::new(BackoffTracker::new(
            10,
            Duration::from_secs(300),
            3,
            Duration::from_millis(100),
            Duration::from_secs(5),
        ));
        let policy = RetryPolicy::builder()
            .max_retries(3)
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(5))
            .jitter(Jitter::None)
            .build();
        let engine = FetchRetryEngine::new(
            Network::Testnet,
            source.clone(),
            cache.clone(),
            backoff.clone(),
            policy,
        );
        Fixture {
            source,
            cache,
            backoff,
            engine,
        }
    }

    fn key(query: &Query) -> CacheKey {
        CacheKey::new(Network::Testnet, query)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_caches_result() {
        let f = fixture(vec![Ok(vec![payment("1")])]);
        let query = Query::new("GA");

        let result = f.engine.execute(&query).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(f.source.calls(), 1);
        assert_eq!(f.cache.get(&key(&query)).await, Some(result));
        assert_eq!(f.backoff.count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_returns_immediately() {
        let f = fixture(vec![Err(404)]);
        let query = Query::new("GA");

        let error = f.engine.execute(&query).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidRequest);
        assert_eq!(f.source.calls(), 1);
        assert_eq!(f.backoff.count().await, 0);
        assert!(f.cache.get(&key(&query)).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_record_every_attempt() {
        let f = fixture(vec![Err(503), Err(503), Err(503)]);
        let query = Query::new("GA");

        let error = f.engine.execute(&query).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::UpstreamUnavailable);
        assert_eq!(f.source.calls(), 3);
        assert_eq!(f.backoff.attempts(&key(&query)).await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_clears_backoff() {
        let f = fixture(vec![Err(429), Ok(vec![payment("1")])]);
        let query = Query::new("GA");

        let started = tokio::time::Instant::now();
        let result = f.engine.execute(&query).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(f.source.calls(), 2);
        assert_eq!(started.elapsed(), Duration::from_millis(100));
        assert_eq!(f.backoff.count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delays_grow_between_attempts() {
        let f = fixture(vec![Err(500), Err(500), Err(500)]);

        let started = tokio::time::Instant::now();
        let error = f.engine.execute(&Query::new("GA")).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::UpstreamInternalError);
        // 100ms after the first failure, 200ms after the second, none after the last
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }
}
