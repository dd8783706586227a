//! Raw failure signals from the upstream ledger API.
//!
//! These errors describe what went wrong talking to Horizon before any
//! classification happens. The [`QueryError`](super::QueryError) mapper turns
//! them into the caller-facing taxonomy.

/// Errors that can occur while calling the upstream ledger API.
///
/// An error either carries the HTTP status the upstream answered with, or no
/// status at all when the request never produced a usable response (network
/// failure, timeout, undecodable body).
///
/// # Examples
///
/// ```rust
/// use paymentscan::UpstreamError;
///
/// let error = UpstreamError::status(503, "fetch operations");
/// assert_eq!(error.status_code(), Some(503));
/// assert!(error.is_retryable());
///
/// let error = UpstreamError::status(404, "fetch operations");
/// assert!(!error.is_retryable());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success HTTP status.
    #[error("Upstream returned HTTP {status} during {operation}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status {
        /// HTTP status code
        status: u16,
        /// Description of the operation that failed (e.g., "fetch operations")
        operation: String,
        /// Optional detail extracted from the response body
        detail: Option<String>,
    },

    /// The request did not complete (connection refused, reset, timeout).
    #[error("Transport failure during {operation}")]
    Transport {
        /// Description of the operation that failed
        operation: String,
        /// The underlying transport error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A response arrived but could not be decoded.
    #[error("Malformed upstream response during {operation}")]
    Decode {
        /// Description of the operation that failed
        operation: String,
        /// The underlying decode error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl UpstreamError {
    /// Helper to create a `Status` error without detail.
    pub fn status(status: u16, operation: impl Into<String>) -> Self {
        UpstreamError::Status {
            status,
            operation: operation.into(),
            detail: None,
        }
    }

    /// Helper to create a `Status` error carrying a detail message.
    pub fn status_with_detail(
        status: u16,
        operation: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        UpstreamError::Status {
            status,
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }

    /// Helper to create a `Transport` error from any error type.
    pub fn transport(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        UpstreamError::Transport {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Helper to create a `Decode` error from any error type.
    pub fn decode(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        UpstreamError::Decode {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// HTTP status the upstream answered with, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            UpstreamError::Transport { .. } | UpstreamError::Decode { .. } => None,
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// Failures without a status, HTTP 429 and every 5xx are retryable. All
    /// other statuses are final.
    pub fn is_retryable(&self) -> bool {
        match self.status_code() {
            None => true,
            Some(status) => status == 429 || status >= 500,
        }
    }
}
