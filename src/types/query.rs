// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Payment queries and the cache keys derived from them

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::constants::{horizon::MAX_PAGE_LIMIT, DEFAULT_PAGE_SIZE};
use crate::config::Network;

/// Number of records requested from upstream in a single page
///
/// Values are clamped to the `1..=200` range Horizon accepts.
///
/// # Examples
///
/// ```
/// use paymentscan::PageSize;
///
/// assert_eq!(PageSize::new(50).as_u32(), 50);
/// assert_eq!(PageSize::new(0).as_u32(), 1);
/// assert_eq!(PageSize::new(1_000).as_u32(), 200);
/// assert_eq!(PageSize::default().as_u32(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSize(u32);

impl PageSize {
    /// Create a page size, clamped to Horizon's accepted range
    pub fn new(size: u32) -> Self {
        Self(size.clamp(1, MAX_PAGE_LIMIT))
    }

    /// Get the inner value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request for one page of an account's payments
///
/// # Examples
///
/// ```
/// use paymentscan::Query;
///
/// let query = Query::new("GABC")
///     .with_asset_filter("USDC:GISSUER")
///     .with_page_size(10)
///     .with_cursor("12345");
///
/// assert_eq!(query.account_id(), "GABC");
/// assert_eq!(query.asset_filter(), Some("USDC:GISSUER"));
/// assert_eq!(query.page_size().as_u32(), 10);
/// assert_eq!(query.cursor(), Some("12345"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    account_id: String,
    asset_filter: Option<String>,
    page_size: PageSize,
    cursor: Option<String>,
}

impl Query {
    /// Create a query for the first page with the default page size
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            asset_filter: None,
            page_size: PageSize::default(),
            cursor: None,
        }
    }

    /// Only keep items whose asset string equals `asset` exactly
    pub fn with_asset_filter(mut self, asset: impl Into<String>) -> Self {
        self.asset_filter = Some(asset.into());
        self
    }

    /// Set the upstream page size
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = PageSize::new(size);
        self
    }

    /// Resume after the given paging token
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn asset_filter(&self) -> Option<&str> {
        self.asset_filter.as_deref()
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

/// Key addressing cached results and backoff state
///
/// Two queries with identical fields on the same network always produce equal
/// keys. Filters are compared verbatim: `"usdc:G..."` and `"USDC:G..."` are
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    network: Network,
    account_id: String,
    asset_filter: Option<String>,
    page_size: PageSize,
    cursor: Option<String>,
}

impl CacheKey {
    /// Derive the key for a query on a network
    pub fn new(network: Network, query: &Query) -> Self {
        Self {
            network,
            account_id: query.account_id.clone(),
            asset_filter: query.asset_filter.clone(),
            page_size: query.page_size,
            cursor: query.cursor.clone(),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.network,
            self.account_id,
            self.asset_filter.as_deref().unwrap_or("any"),
            self.page_size,
            self.cursor.as_deref().unwrap_or("start")
        )
    }
}
