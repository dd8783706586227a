//! Span creation helpers for paymentscan operations.
//!
//! Telemetry is kept apart from business logic: instead of `#[instrument]`
//! attributes, each instrumented operation has a span helper here and the
//! caller attaches it to the future it drives.
//!
//! Usage pattern:
//! ```rust,ignore
//! async fn my_operation(&self, param: &str) -> Result<T, E> {
//!     async move {
//!         // Business logic here
//!     }
//!     .instrument(spans::my_operation(param))
//!     .await
//! }
//! ```

use tracing::Span;

use crate::config::Network;
use crate::types::query::PageSize;

/// Create span for serving one payment query.
///
/// This is the main public API entry point.
///
/// Parent: None (root span for this operation)
/// Children: fetch_page spans (one per attempt)
#[inline]
pub(crate) fn get_payments(
    network: Network,
    account_id: &str,
    asset_filter: Option<&str>,
    page_size: PageSize,
    cursor: Option<&str>,
) -> Span {
    tracing::info_span!(
        "paymentscan.get_payments",
        network = %network,
        account_id = %account_id,
        asset_filter = asset_filter.unwrap_or("any"),
        page_size = page_size.as_u32(),
        cursor = cursor.unwrap_or("start"),
    )
}

/// Create span for one upstream page fetch attempt.
///
/// Parent: get_payments span
/// Children: resolve_memo spans
#[inline]
pub(crate) fn fetch_page(account_id: &str, attempt: u32, max_retries: u32) -> Span {
    tracing::debug_span!(
        "paymentscan.fetch_page",
        account_id = %account_id,
        attempt = attempt,
        max_retries = max_retries,
    )
}

/// Create span for resolving the memo of a payment's transaction.
///
/// Parent: fetch_page span
/// Children: fetch_transaction span
#[inline]
pub(crate) fn resolve_memo(tx_hash: &str) -> Span {
    tracing::trace_span!("paymentscan.resolve_memo", tx_hash = %tx_hash)
}

/// Create span for a Horizon transaction lookup.
///
/// Parent: resolve_memo span
#[inline]
pub(crate) fn fetch_transaction(tx_hash: &str) -> Span {
    tracing::trace_span!("paymentscan.fetch_transaction", tx_hash = %tx_hash)
}
