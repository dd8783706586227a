// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Reshapes raw upstream operation records into [`PaymentItem`]s
//!
//! A raw page is processed in three steps:
//!
//! 1. Records that are not payments are dropped, the rest are mapped to the
//!    canonical shape and matched against the optional asset filter
//! 2. Memos of the retained items are resolved from their parent transactions,
//!    a bounded number at a time; a failed lookup leaves the memo empty
//! 3. The next cursor is taken from the last raw record, before any filtering,
//!    so paging never skips records a filter removed

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn, Instrument};

use crate::config::constants::DEFAULT_MEMO_CONCURRENCY;
use crate::tracing::spans;
use crate::types::payment::{PaymentItem, PaymentKind, QueryResult, NATIVE_ASSET_SYMBOL};
use crate::upstream::{LedgerSource, RawOperation};

/// Maps raw pages to [`QueryResult`]s, using a [`LedgerSource`] for memo lookups
#[derive(Clone)]
pub struct Normalizer {
    source: Arc<dyn LedgerSource>,
    memo_concurrency: usize,
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("source", &self.source.name())
            .field("memo_concurrency", &self.memo_concurrency)
            .finish()
    }
}

impl Normalizer {
    pub fn new(source: Arc<dyn LedgerSource>) -> Self {
        Self {
            source,
            memo_concurrency: DEFAULT_MEMO_CONCURRENCY,
        }
    }

    /// Limits how many memo lookups run at once (min 1)
    pub fn with_memo_concurrency(mut self, limit: usize) -> Self {
        self.memo_concurrency = limit.max(1);
        self
    }

    /// Normalizes one raw page
    ///
    /// Never fails: records that cannot be mapped are skipped and memo lookup
    /// failures only clear the memo.
    pub async fn normalize(
        &self,
        records: Vec<RawOperation>,
        asset_filter: Option<&str>,
    ) -> QueryResult {
        let next_cursor = records.last().map(|record| record.paging_token.clone());
        let total = records.len();

        let mut items: Vec<PaymentItem> = records
            .into_iter()
            .filter_map(to_payment_item)
            .filter(|item| asset_filter.is_none_or(|filter| item.asset == filter))
            .collect();

        let memos: Vec<Option<String>> =
            stream::iter(items.iter().map(|item| self.resolve_memo(&item.tx_hash)))
                .buffered(self.memo_concurrency)
                .collect()
                .await;
        for (item, memo) in items.iter_mut().zip(memos) {
            item.memo = memo;
        }

        debug!(
            records = total,
            items = items.len(),
            asset_filter = asset_filter.unwrap_or("any"),
            "Normalized operations page"
        );

        QueryResult { items, next_cursor }
    }

    async fn resolve_memo(&self, tx_hash: &str) -> Option<String> {
        match self
            .source
            .fetch_memo(tx_hash)
            .instrument(spans::resolve_memo(tx_hash))
            .await
        {
            Ok(memo) => memo,
            Err(e) => {
                debug!(tx_hash, error = %e, "Memo lookup failed, leaving memo empty");
                None
            }
        }
    }
}

/// Maps a raw record to a payment item without its memo
///
/// Returns `None` for non-payment operations and for payments missing the
/// fields needed to describe them.
fn to_payment_item(record: RawOperation) -> Option<PaymentItem> {
    let kind = PaymentKind::from_operation_type(&record.operation_type)?;

    let Some(asset) = asset_string(&record) else {
        warn!(id = %record.id, "Dropping payment with incomplete asset description");
        return None;
    };

    let Some(amount) = record.amount.filter(|amount| !amount.is_empty()) else {
        warn!(id = %record.id, "Dropping payment without amount");
        return None;
    };

    Some(PaymentItem {
        id: record.id,
        kind,
        amount,
        asset,
        from: record.from,
        to: record.to,
        memo: None,
        timestamp: record.created_at,
        tx_hash: record.transaction_hash,
        paging_token: record.paging_token,
    })
}

/// `"XLM"` for the native asset, `"CODE:ISSUER"` for issued assets
fn asset_string(record: &RawOperation) -> Option<String> {
    match record.asset_type.as_deref() {
        Some("native") => Some(NATIVE_ASSET_SYMBOL.to_string()),
        _ => {
            let code = record.asset_code.as_deref()?;
            let issuer = record.asset_issuer.as_deref()?;
            Some(format!("{code}:{issuer}"))
        }
    }
}
