// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Upstream ledger API abstraction
//!
//! The query layer talks to the ledger through the [`LedgerSource`] trait, so
//! the engine can be exercised against scripted sources in tests and pointed
//! at any Horizon-compatible endpoint in production.
//!
//! # Architecture
//!
//! 1. The engine turns a [`Query`](crate::Query) into an [`OperationsRequest`]
//! 2. [`LedgerSource::fetch_operations`] returns one page of [`RawOperation`]s,
//!    newest first
//! 3. The normalizer calls [`LedgerSource::fetch_memo`] for each retained
//!    payment to resolve its parent transaction's memo
//!
//! [`HorizonClient`] is the HTTP implementation.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::UpstreamError;
use crate::types::query::Query;

mod horizon;

pub use horizon::HorizonClient;

/// Record ordering requested from upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    Asc,
    /// Newest first
    #[default]
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of one upstream page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationsRequest {
    pub account_id: String,
    pub order: Order,
    pub limit: u32,
    pub cursor: Option<String>,
}

impl From<&Query> for OperationsRequest {
    fn from(query: &Query) -> Self {
        Self {
            account_id: query.account_id().to_string(),
            order: Order::Desc,
            limit: query.page_size().as_u32(),
            cursor: query.cursor().map(str::to_string),
        }
    }
}

/// One operation record as returned by Horizon
///
/// Only the fields the normalizer needs are modeled; unknown fields are
/// ignored. Payment-specific fields are optional because other operation
/// types omit them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOperation {
    pub id: String,
    pub paging_token: String,
    /// Operation type name (`payment`, `create_account`, ...)
    #[serde(rename = "type")]
    pub operation_type: String,
    pub created_at: DateTime<Utc>,
    pub transaction_hash: String,
    #[serde(default)]
    pub amount: Option<String>,
    /// `native`, `credit_alphanum4` or `credit_alphanum12`
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// A remote, paged, cursor-based source of account operations
///
/// Implementations must be thread-safe; the service shares one source across
/// all concurrent calls.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Fetches one page of operations for an account
    async fn fetch_operations(
        &self,
        request: &OperationsRequest,
    ) -> Result<Vec<RawOperation>, UpstreamError>;

    /// Fetches the memo of a transaction
    ///
    /// Returns `Ok(None)` when the transaction carries no memo.
    async fn fetch_memo(&self, tx_hash: &str) -> Result<Option<String>, UpstreamError>;

    /// Returns a human-readable name for this source
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &'static str {
        "LedgerSource"
    }
}
