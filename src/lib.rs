// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! # paymentscan
//!
//! A resilient query layer for Stellar payment history.
//!
//! paymentscan sits between an application and a rate-limited Horizon server.
//! Repeated reads are served from a bounded in-memory cache, keys that keep
//! failing are throttled locally instead of hitting upstream again, and
//! transient upstream failures are retried with exponential backoff and
//! jitter. Raw operation records are reshaped into a stable [`PaymentItem`]
//! schema.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use paymentscan::{Network, PaymentQueryService, PaymentScanConfigBuilder, QueryError};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PaymentScanConfigBuilder::new()
//!     .network(Network::Public)
//!     .cache_ttl(Duration::from_secs(60))
//!     .build();
//! let service = PaymentQueryService::horizon(config)?;
//!
//! match service.get_payments("GABC...", Some("USDC:GA5Z..."), 50, None).await {
//!     Ok(page) => println!("{} payments", page.len()),
//!     Err(QueryError::Throttled { retry_after }) => {
//!         println!("retry in {}ms", retry_after.as_millis());
//!     }
//!     Err(e) => println!("{e} -> {}", e.caller_status().as_u16()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Components
//!
//! - [`QueryCache`]: sliding-TTL result cache with LRU eviction
//! - [`BackoffTracker`]: per-key failure history gating upstream access
//! - [`FetchRetryEngine`]: bounded retries driven by a [`RetryPolicy`]
//! - [`Normalizer`]: maps raw records to [`PaymentItem`]s
//! - [`QueryError`]: classified errors with caller-facing statuses
//! - [`LedgerSource`]: upstream abstraction, implemented by [`HorizonClient`]

pub mod backoff;
pub mod cache;
pub mod config;
pub mod errors;
pub mod normalize;
pub mod retry;
pub mod service;
pub(crate) mod tracing;
pub mod types;
pub mod upstream;

pub use backoff::{BackoffStatus, BackoffTracker};
pub use cache::{CacheStats, QueryCache};
pub use config::{ConfigError, Network, PaymentScanConfig, PaymentScanConfigBuilder};
pub use errors::{CallerStatus, ErrorKind, QueryError, UpstreamError};
pub use normalize::Normalizer;
pub use retry::{FetchRetryEngine, Jitter, RetryPolicy, RetryPolicyBuilder};
pub use service::{PaymentQueryService, ServiceStats};
pub use types::cache::AccessSequence;
pub use types::payment::{PaymentItem, PaymentKind, QueryResult, NATIVE_ASSET_SYMBOL};
pub use types::query::{CacheKey, PageSize, Query};
pub use upstream::{HorizonClient, LedgerSource, OperationsRequest, Order, RawOperation};
