//! Configuration for paymentscan operations
//!
//! This module provides the configuration surface for the query layer: which
//! Stellar network to talk to, how large and how fresh the result cache is,
//! how long failure history is retained, and how aggressively upstream calls
//! are retried. Configuration is injected as plain values; loading it from
//! files or the environment is the caller's concern.
//!
//! # Example: Using defaults
//!
//! ```rust
//! use paymentscan::PaymentScanConfig;
//!
//! // Testnet, 500 cached results with a 30s sliding TTL, 3 attempts per call
//! let config = PaymentScanConfig::default();
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use paymentscan::{Network, PaymentScanConfigBuilder};
//! use std::time::Duration;
//!
//! let config = PaymentScanConfigBuilder::new()
//!     .network(Network::Public)
//!     .cache_max_entries(2_000)
//!     .cache_ttl(Duration::from_secs(60))
//!     .max_retries(5)
//!     .build();
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::retry::{Jitter, RetryPolicy};

pub mod constants;

/// Stellar network served by a query layer instance
///
/// The network selects the default Horizon host and namespaces cache keys, so
/// results from different networks never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Stellar testnet
    #[default]
    Testnet,
    /// Stellar public network (mainnet)
    Public,
}

impl Network {
    /// Default Horizon base URL for this network
    pub fn horizon_url(&self) -> &'static str {
        match self {
            Network::Testnet => constants::horizon::TESTNET_URL,
            Network::Public => constants::horizon::PUBLIC_URL,
        }
    }

    /// Namespace used in cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Public => "public",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "public" | "mainnet" => Ok(Network::Public),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Errors raised when a configuration cannot be used
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Network name did not match a known Stellar network
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// Horizon URL override could not be parsed
    #[error("Invalid Horizon URL {url}")]
    InvalidHorizonUrl {
        /// The rejected URL
        url: String,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },

    /// A numeric knob was outside its accepted range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Configuration for a [`PaymentQueryService`](crate::PaymentQueryService)
///
/// Use [`PaymentScanConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone)]
pub struct PaymentScanConfig {
    /// Network selector (Horizon host and cache namespace)
    /// Default: testnet
    pub network: Network,

    /// Explicit Horizon base URL, overriding the network default
    pub horizon_url: Option<String>,

    /// Maximum number of cached query results
    /// Default: 500
    pub cache_max_entries: usize,

    /// Sliding TTL for cached results
    /// Default: 30 seconds
    pub cache_ttl: Duration,

    /// Maximum number of keys with failure history
    /// Default: 1000
    pub backoff_max_entries: usize,

    /// Retention of failure history per key
    /// Default: 5 minutes
    pub backoff_retention: Duration,

    /// Total upstream attempts per call
    /// Default: 3
    pub max_retries: u32,

    /// Base delay for exponential backoff
    /// Default: 500ms
    pub base_delay: Duration,

    /// Cap for a single backoff delay
    /// Default: 10 seconds
    pub max_delay: Duration,

    /// Timeout for a single HTTP request
    /// Default: 30 seconds
    pub http_timeout: Duration,
}

impl Default for PaymentScanConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            horizon_url: None,
            cache_max_entries: constants::DEFAULT_CACHE_MAX_ENTRIES,
            cache_ttl: constants::DEFAULT_CACHE_TTL,
            backoff_max_entries: constants::DEFAULT_BACKOFF_MAX_ENTRIES,
            backoff_retention: constants::DEFAULT_BACKOFF_RETENTION,
            max_retries: constants::DEFAULT_MAX_RETRIES,
            base_delay: constants::DEFAULT_BASE_DELAY,
            max_delay: constants::DEFAULT_MAX_DELAY,
            http_timeout: constants::DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl PaymentScanConfig {
    /// Create config with defaults for the given network
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Effective Horizon base URL
    ///
    /// Returns the override if set, otherwise the network default.
    ///
    /// # Example
    ///
    /// ```rust
    /// use paymentscan::{Network, PaymentScanConfig};
    ///
    /// let config = PaymentScanConfig::for_network(Network::Public);
    /// assert_eq!(config.horizon_base_url().unwrap().as_str(), "https://horizon.stellar.org/");
    /// ```
    pub fn horizon_base_url(&self) -> Result<Url, ConfigError> {
        let raw = self
            .horizon_url
            .as_deref()
            .unwrap_or_else(|| self.network.horizon_url());
        Url::parse(raw).map_err(|source| ConfigError::InvalidHorizonUrl {
            url: raw.to_string(),
            source,
        })
    }

    /// Retry policy for the fetch-retry engine, with full jitter
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.max_retries)
            .base_delay(self.base_delay)
            .max_delay(self.max_delay)
            .jitter(Jitter::Full)
            .build()
    }

    /// Check that every knob is usable
    ///
    /// Zero capacities, a zero attempt budget, or a max delay below the base
    /// delay are rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_max_entries == 0 {
            return Err(ConfigError::invalid("cache_max_entries", "must be at least 1"));
        }
        if self.backoff_max_entries == 0 {
            return Err(ConfigError::invalid(
                "backoff_max_entries",
                "must be at least 1",
            ));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::invalid("max_retries", "must be at least 1"));
        }
        if self.max_delay < self.base_delay {
            return Err(ConfigError::invalid(
                "max_delay",
                format!(
                    "{}ms is below base_delay {}ms",
                    self.max_delay.as_millis(),
                    self.base_delay.as_millis()
                ),
            ));
        }
        self.horizon_base_url()?;
        Ok(())
    }
}

/// Builder for [`PaymentScanConfig`]
///
/// # Example
///
/// ```rust
/// use paymentscan::PaymentScanConfigBuilder;
/// use std::time::Duration;
///
/// let config = PaymentScanConfigBuilder::new()
///     .horizon_url("http://localhost:8000")
///     .base_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(2))
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Default)]
pub struct PaymentScanConfigBuilder {
    config: PaymentScanConfig,
}

impl PaymentScanConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the network
    pub fn network(mut self, network: Network) -> Self {
        self.config.network = network;
        self
    }

    /// Override the Horizon base URL
    pub fn horizon_url(mut self, url: impl Into<String>) -> Self {
        self.config.horizon_url = Some(url.into());
        self
    }

    /// Set result cache capacity
    pub fn cache_max_entries(mut self, max_entries: usize) -> Self {
        self.config.cache_max_entries = max_entries;
        self
    }

    /// Set result cache sliding TTL
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Set backoff tracker capacity
    pub fn backoff_max_entries(mut self, max_entries: usize) -> Self {
        self.config.backoff_max_entries = max_entries;
        self
    }

    /// Set retention of per-key failure history
    pub fn backoff_retention(mut self, retention: Duration) -> Self {
        self.config.backoff_retention = retention;
        self
    }

    /// Set total upstream attempts per call
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set base backoff delay
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    /// Set maximum backoff delay
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    /// Set per-request HTTP timeout
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> PaymentScanConfig {
        self.config
    }
}
