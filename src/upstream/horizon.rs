// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Horizon HTTP implementation of [`LedgerSource`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace, Instrument};
use url::Url;

use super::{LedgerSource, OperationsRequest, RawOperation};
use crate::config::{ConfigError, PaymentScanConfig};
use crate::errors::UpstreamError;
use crate::tracing::spans;

const FETCH_OPERATIONS: &str = "fetch operations";
const FETCH_MEMO: &str = "fetch memo";

/// Collection envelope used by Horizon list endpoints
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
}

#[derive(Debug, Deserialize)]
struct Embedded<T> {
    records: Vec<T>,
}

/// Subset of a Horizon transaction resource
#[derive(Debug, Deserialize)]
struct TransactionRecord {
    #[serde(default)]
    memo_type: Option<String>,
    #[serde(default)]
    memo: Option<String>,
}

/// Horizon error body (RFC 7807 problem document)
#[derive(Debug, Deserialize)]
struct Problem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// [`LedgerSource`] backed by a Horizon server
///
/// # Example
///
/// ```rust,no_run
/// use paymentscan::{HorizonClient, Network, PaymentScanConfig};
///
/// # fn example() -> Result<(), paymentscan::ConfigError> {
/// let client = HorizonClient::from_config(&PaymentScanConfig::for_network(Network::Public))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HorizonClient {
    client: Client,
    base_url: Url,
}

impl HorizonClient {
    /// Creates a client for the Horizon server at `base_url`
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ConfigError> {
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                field: "horizon_url",
                reason: format!("{base_url} cannot be used as a base URL"),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("paymentscan/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self { client, base_url })
    }

    /// Creates a client from the network / URL override and HTTP timeout of a config
    pub fn from_config(config: &PaymentScanConfig) -> Result<Self, ConfigError> {
        Self::new(config.horizon_base_url()?, config.http_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/accounts/{account}/operations?order=..&limit=..[&cursor=..]`
    fn operations_url(&self, request: &OperationsRequest) -> Url {
        let mut url = self.endpoint(&["accounts", &request.account_id, "operations"]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("order", request.order.as_str())
                .append_pair("limit", &request.limit.to_string());
            if let Some(cursor) = &request.cursor {
                pairs.append_pair("cursor", cursor);
            }
        }
        url
    }

    /// `{base}/transactions/{hash}`
    fn transaction_url(&self, tx_hash: &str) -> Url {
        self.endpoint(&["transactions", tx_hash])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        // Checked in `new`: the base URL always has path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        operation: &'static str,
    ) -> Result<T, UpstreamError> {
        trace!(url = %url, "Sending Horizon request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<Problem>()
                .await
                .ok()
                .and_then(|problem| problem.detail.or(problem.title));
            debug!(status = status.as_u16(), operation, "Horizon returned an error status");
            return Err(match detail {
                Some(detail) => UpstreamError::status_with_detail(status.as_u16(), operation, detail),
                None => UpstreamError::status(status.as_u16(), operation),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::decode(operation, e))
    }
}

#[async_trait]
impl LedgerSource for HorizonClient {
    async fn fetch_operations(
        &self,
        request: &OperationsRequest,
    ) -> Result<Vec<RawOperation>, UpstreamError> {
        let url = self.operations_url(request);
        let page: Page<RawOperation> = self.get_json(url, FETCH_OPERATIONS).await?;
        debug!(
            account = %request.account_id,
            records = page.embedded.records.len(),
            "Fetched operations page"
        );
        Ok(page.embedded.records)
    }

    async fn fetch_memo(&self, tx_hash: &str) -> Result<Option<String>, UpstreamError> {
        let url = self.transaction_url(tx_hash);
        let transaction: TransactionRecord = self
            .get_json(url, FETCH_MEMO)
            .instrument(spans::fetch_transaction(tx_hash))
            .await?;

        if transaction.memo_type.as_deref() == Some("none") {
            return Ok(None);
        }
        Ok(transaction.memo.filter(|memo| !memo.is_empty()))
    }

    fn name(&self) -> &'static str {
        "HorizonClient"
    }
}
