//! Error types for the paymentscan library.
//!
//! Two layers of errors exist:
//!
//! - [`UpstreamError`] - raw failure signals from the ledger API (an HTTP
//!   status, or no status for transport and decode failures)
//! - [`QueryError`] - the classified, caller-facing taxonomy every public
//!   query operation returns
//!
//! The mapping between them is a fixed table held in one place,
//! [`ErrorKind::from_status`]:
//!
//! | Upstream status       | [`ErrorKind`]            | [`CallerStatus`]       |
//! |-----------------------|--------------------------|------------------------|
//! | 429                   | `RateLimited`            | `ServiceUnavailable`   |
//! | 500                   | `UpstreamInternalError`  | `BadGateway`           |
//! | 502, 503, 504, other 5xx | `UpstreamUnavailable` | `ServiceUnavailable`   |
//! | other 4xx             | `InvalidRequest`         | `BadRequest`           |
//! | none, 1xx-3xx         | `InternalError`          | `InternalServerError`  |
//! | backoff gate          | `Throttled`              | `ServiceUnavailable`   |
//!
//! # Examples
//!
//! ```rust,ignore
//! use paymentscan::{CallerStatus, PaymentQueryService, QueryError};
//!
//! match service.get_payments("GABC...", None, 20, None).await {
//!     Ok(result) => println!("{} payments", result.items.len()),
//!     Err(QueryError::Throttled { retry_after }) => {
//!         eprintln!("cooling down, retry in {}ms", retry_after.as_millis());
//!     }
//!     Err(e) => {
//!         let status: CallerStatus = e.caller_status();
//!         eprintln!("{} ({})", e, status.as_u16());
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use serde::Serialize;

mod upstream;

pub use upstream::UpstreamError;

/// Classification of a failed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Rejected by the backoff gate without contacting upstream
    Throttled,
    /// Upstream answered 429
    RateLimited,
    /// Upstream answered 500
    UpstreamInternalError,
    /// Upstream answered 502/503/504 (or another 5xx)
    UpstreamUnavailable,
    /// Upstream rejected the request (4xx other than 429)
    InvalidRequest,
    /// Transport failure or an unexpected upstream answer
    InternalError,
}

impl ErrorKind {
    /// Classify an upstream status; `None` means no response was obtained.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use paymentscan::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::from_status(Some(429)), ErrorKind::RateLimited);
    /// assert_eq!(ErrorKind::from_status(Some(500)), ErrorKind::UpstreamInternalError);
    /// assert_eq!(ErrorKind::from_status(Some(503)), ErrorKind::UpstreamUnavailable);
    /// assert_eq!(ErrorKind::from_status(Some(404)), ErrorKind::InvalidRequest);
    /// assert_eq!(ErrorKind::from_status(None), ErrorKind::InternalError);
    /// ```
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(429) => ErrorKind::RateLimited,
            Some(500) => ErrorKind::UpstreamInternalError,
            Some(status) if status > 500 => ErrorKind::UpstreamUnavailable,
            Some(400..=499) => ErrorKind::InvalidRequest,
            Some(_) | None => ErrorKind::InternalError,
        }
    }

    /// Status a caller-facing surface should answer with.
    pub fn caller_status(&self) -> CallerStatus {
        match self {
            ErrorKind::Throttled
            | ErrorKind::RateLimited
            | ErrorKind::UpstreamUnavailable => CallerStatus::ServiceUnavailable,
            ErrorKind::UpstreamInternalError => CallerStatus::BadGateway,
            ErrorKind::InvalidRequest => CallerStatus::BadRequest,
            ErrorKind::InternalError => CallerStatus::InternalServerError,
        }
    }

    /// Transient upstream conditions that were retried before surfacing.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimited
                | ErrorKind::UpstreamInternalError
                | ErrorKind::UpstreamUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Throttled => "throttled",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::UpstreamInternalError => "upstream_internal_error",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::InternalError => "internal_error",
        };
        f.write_str(name)
    }
}

/// Fixed status a caller-facing surface reports for each error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CallerStatus {
    BadRequest,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
}

impl CallerStatus {
    /// The HTTP status code.
    pub const fn as_u16(&self) -> u16 {
        match self {
            CallerStatus::BadRequest => 400,
            CallerStatus::InternalServerError => 500,
            CallerStatus::BadGateway => 502,
            CallerStatus::ServiceUnavailable => 503,
        }
    }
}

/// Classified error returned by every query operation.
///
/// Each variant maps to exactly one [`ErrorKind`] and one [`CallerStatus`].
/// The `Display` message is safe to show to end users.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The key is cooling down after repeated failures; upstream was not
    /// contacted.
    #[error("Too many failed requests for this query, retry after {}ms", .retry_after.as_millis())]
    Throttled {
        /// Remaining cool-down
        retry_after: Duration,
    },

    /// Upstream rate limit persisted through every retry.
    #[error("Upstream rate limit exceeded")]
    RateLimited(#[source] UpstreamError),

    /// Upstream kept failing internally.
    #[error("Upstream internal error")]
    UpstreamInternalError(#[source] UpstreamError),

    /// Upstream stayed unavailable through every retry.
    #[error("Upstream temporarily unavailable")]
    UpstreamUnavailable(#[source] UpstreamError),

    /// Upstream rejected the request as invalid.
    #[error("Request rejected by upstream: {0}")]
    InvalidRequest(#[source] UpstreamError),

    /// Transport failure or unexpected upstream behavior.
    #[error("Internal error while querying upstream")]
    InternalError(#[source] UpstreamError),
}

impl QueryError {
    /// Map a raw upstream failure into the classified taxonomy.
    pub fn from_upstream(error: UpstreamError) -> Self {
        match ErrorKind::from_status(error.status_code()) {
            ErrorKind::RateLimited => QueryError::RateLimited(error),
            ErrorKind::UpstreamInternalError => QueryError::UpstreamInternalError(error),
            ErrorKind::UpstreamUnavailable => QueryError::UpstreamUnavailable(error),
            ErrorKind::InvalidRequest => QueryError::InvalidRequest(error),
            ErrorKind::InternalError | ErrorKind::Throttled => QueryError::InternalError(error),
        }
    }

    /// Create a `Throttled` error with the remaining cool-down.
    pub fn throttled(retry_after: Duration) -> Self {
        QueryError::Throttled { retry_after }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Throttled { .. } => ErrorKind::Throttled,
            QueryError::RateLimited(_) => ErrorKind::RateLimited,
            QueryError::UpstreamInternalError(_) => ErrorKind::UpstreamInternalError,
            QueryError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            QueryError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            QueryError::InternalError(_) => ErrorKind::InternalError,
        }
    }

    pub fn caller_status(&self) -> CallerStatus {
        self.kind().caller_status()
    }

    /// Cool-down hint, only present on `Throttled`.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            QueryError::Throttled { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Whether the engine retries the underlying failure.
    ///
    /// `Throttled` never reaches the engine and reports `false`.
    pub fn is_retryable(&self) -> bool {
        self.upstream().is_some_and(UpstreamError::is_retryable)
    }

    /// The raw upstream failure behind this error, if any.
    pub fn upstream(&self) -> Option<&UpstreamError> {
        match self {
            QueryError::Throttled { .. } => None,
            QueryError::RateLimited(e)
            | QueryError::UpstreamInternalError(e)
            | QueryError::UpstreamUnavailable(e)
            | QueryError::InvalidRequest(e)
            | QueryError::InternalError(e) => Some(e),
        }
    }
}

impl From<UpstreamError> for QueryError {
    fn from(error: UpstreamError) -> Self {
        QueryError::from_upstream(error)
    }
}
