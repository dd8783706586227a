// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for paymentscan integration tests
//!
//! Provides a scriptable [`LedgerSource`] so the service can be exercised
//! without a Horizon server.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use paymentscan::{
    LedgerSource, OperationsRequest, PaymentScanConfig, PaymentScanConfigBuilder, RawOperation,
    UpstreamError,
};

/// One scripted answer to `fetch_operations`
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Reply {
    Page(Vec<RawOperation>),
    Status(u16),
    /// Connection-level failure, no HTTP status
    Transport,
}

/// Mock LedgerSource for testing the query layer
///
/// Replies to `fetch_operations` are consumed from a script in order; once the
/// script is exhausted the fallback reply is used for every further call.
///
/// # Example
///
/// ```rust,ignore
/// let mock = MockLedgerSource::new()
///     .then(Reply::Status(503))
///     .then(Reply::Page(vec![payment("1", "tx1")]))
///     .with_memo("tx1", "invoice-1");
///
/// let service = PaymentQueryService::new(test_config(), Arc::new(mock));
/// ```
#[allow(dead_code)]
pub struct MockLedgerSource {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    memos: HashMap<String, Option<String>>,
    failing_memos: Vec<String>,
    latency: Option<Duration>,
    operation_calls: AtomicUsize,
    memo_calls: AtomicUsize,
    requests: Mutex<Vec<OperationsRequest>>,
}

#[allow(dead_code)]
impl MockLedgerSource {
    /// Create a source that answers every call with an empty page
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Reply::Page(Vec::new()),
            memos: HashMap::new(),
            failing_memos: Vec::new(),
            latency: None,
            operation_calls: AtomicUsize::new(0),
            memo_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a source that always gives the same reply
    pub fn always(reply: Reply) -> Self {
        Self::new().otherwise(reply)
    }

    /// Append a reply to the script
    pub fn then(self, reply: Reply) -> Self {
        self.script.lock().unwrap().push_back(reply);
        self
    }

    /// Reply used once the script is exhausted
    pub fn otherwise(mut self, reply: Reply) -> Self {
        self.fallback = reply;
        self
    }

    /// Memo returned for a transaction
    pub fn with_memo(mut self, tx_hash: &str, memo: &str) -> Self {
        self.memos.insert(tx_hash.to_string(), Some(memo.to_string()));
        self
    }

    /// Make the memo lookup for a transaction fail with a 503
    pub fn with_failing_memo(mut self, tx_hash: &str) -> Self {
        self.failing_memos.push(tx_hash.to_string());
        self
    }

    /// Delay every `fetch_operations` answer by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn operation_calls(&self) -> usize {
        self.operation_calls.load(Ordering::SeqCst)
    }

    pub fn memo_calls(&self) -> usize {
        self.memo_calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<OperationsRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerSource for MockLedgerSource {
    async fn fetch_operations(
        &self,
        request: &OperationsRequest,
    ) -> Result<Vec<RawOperation>, UpstreamError> {
        self.operation_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            Reply::Page(records) => Ok(records),
            Reply::Status(status) => Err(UpstreamError::status(status, "fetch operations")),
            Reply::Transport => Err(UpstreamError::transport(
                "fetch operations",
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
            )),
        }
    }

    async fn fetch_memo(&self, tx_hash: &str) -> Result<Option<String>, UpstreamError> {
        self.memo_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_memos.iter().any(|hash| hash == tx_hash) {
            return Err(UpstreamError::status(503, "fetch memo"));
        }
        Ok(self.memos.get(tx_hash).cloned().flatten())
    }

    fn name(&self) -> &'static str {
        "MockLedgerSource"
    }
}

/// Config with small, round delays: 100ms base, 5s max, 3 attempts
#[allow(dead_code)]
pub fn test_config() -> PaymentScanConfig {
    PaymentScanConfigBuilder::new()
        .cache_max_entries(16)
        .cache_ttl(Duration::from_secs(30))
        .backoff_max_entries(16)
        .backoff_retention(Duration::from_secs(300))
        .max_retries(3)
        .base_delay(Duration::from_millis(100))
        .max_delay(Duration::from_secs(5))
        .build()
}

/// Higher ids are newer
fn created_at(id: &str) -> DateTime<Utc> {
    let offset = id.parse::<i64>().unwrap_or(0);
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(offset)
}

/// Helper to create an operation record of any type
#[allow(dead_code)]
pub fn operation(id: &str, operation_type: &str, tx_hash: &str) -> RawOperation {
    RawOperation {
        id: id.to_string(),
        paging_token: format!("{id}-pt"),
        operation_type: operation_type.to_string(),
        created_at: created_at(id),
        transaction_hash: tx_hash.to_string(),
        amount: None,
        asset_type: None,
        asset_code: None,
        asset_issuer: None,
        from: None,
        to: None,
    }
}

/// Helper to create a native `payment` record
#[allow(dead_code)]
pub fn payment(id: &str, tx_hash: &str) -> RawOperation {
    RawOperation {
        amount: Some("10.0000000".to_string()),
        asset_type: Some("native".to_string()),
        from: Some("GSENDER".to_string()),
        to: Some("GRECEIVER".to_string()),
        ..operation(id, "payment", tx_hash)
    }
}

/// Helper to create an issued-asset payment record of the given type
#[allow(dead_code)]
pub fn issued_payment(
    id: &str,
    operation_type: &str,
    tx_hash: &str,
    code: &str,
    issuer: &str,
) -> RawOperation {
    RawOperation {
        amount: Some("5.5000000".to_string()),
        asset_type: Some(if code.len() <= 4 {
            "credit_alphanum4".to_string()
        } else {
            "credit_alphanum12".to_string()
        }),
        asset_code: Some(code.to_string()),
        asset_issuer: Some(issuer.to_string()),
        from: Some("GSENDER".to_string()),
        to: Some("GRECEIVER".to_string()),
        ..operation(id, operation_type, tx_hash)
    }
}

/// Install a test-writer subscriber once; honors `RUST_LOG`
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
