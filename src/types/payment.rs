// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Normalized payment items and query results

use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, ParseBigDecimalError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of payment operation an item was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Plain `payment` operation
    Payment,
    /// `path_payment_strict_receive` (formerly `path_payment`)
    PathPaymentStrictReceive,
    /// `path_payment_strict_send`
    PathPaymentStrictSend,
}

impl PaymentKind {
    /// Map a Horizon operation type name to a payment kind
    ///
    /// Returns `None` for operation types that do not move funds as a
    /// payment (account creation, trustline changes, offers, ...).
    ///
    /// # Examples
    ///
    /// ```
    /// use paymentscan::PaymentKind;
    ///
    /// assert_eq!(PaymentKind::from_operation_type("payment"), Some(PaymentKind::Payment));
    /// assert_eq!(PaymentKind::from_operation_type("create_account"), None);
    /// ```
    pub fn from_operation_type(operation_type: &str) -> Option<Self> {
        match operation_type {
            "payment" => Some(PaymentKind::Payment),
            "path_payment_strict_receive" | "path_payment" => {
                Some(PaymentKind::PathPaymentStrictReceive)
            }
            "path_payment_strict_send" => Some(PaymentKind::PathPaymentStrictSend),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Payment => "payment",
            PaymentKind::PathPaymentStrictReceive => "path_payment_strict_receive",
            PaymentKind::PathPaymentStrictSend => "path_payment_strict_send",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment in canonical shape
///
/// Built once by the normalizer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentItem {
    /// Upstream operation id
    pub id: String,
    pub kind: PaymentKind,
    /// Amount as the decimal string upstream reported (e.g. `"10.0000000"`)
    pub amount: String,
    /// `"XLM"` for the native asset, `"CODE:ISSUER"` otherwise
    pub asset: String,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Memo of the parent transaction; absent when there is none or the
    /// lookup failed
    pub memo: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
    pub paging_token: String,
}

impl PaymentItem {
    /// Parse the amount into an arbitrary-precision decimal
    ///
    /// # Examples
    ///
    /// ```
    /// use bigdecimal::BigDecimal;
    /// use chrono::Utc;
    /// use paymentscan::{PaymentItem, PaymentKind};
    /// use std::str::FromStr;
    ///
    /// let item = PaymentItem {
    ///     id: "1".into(),
    ///     kind: PaymentKind::Payment,
    ///     amount: "10.5000000".into(),
    ///     asset: "XLM".into(),
    ///     from: None,
    ///     to: None,
    ///     memo: None,
    ///     timestamp: Utc::now(),
    ///     tx_hash: "abc".into(),
    ///     paging_token: "1".into(),
    /// };
    /// assert_eq!(item.amount_decimal().unwrap(), BigDecimal::from_str("10.5").unwrap());
    /// ```
    pub fn amount_decimal(&self) -> Result<BigDecimal, ParseBigDecimalError> {
        BigDecimal::from_str(&self.amount)
    }

    /// Whether this item moves the native asset
    pub fn is_native(&self) -> bool {
        self.asset == NATIVE_ASSET_SYMBOL
    }
}

/// Symbol used for the network's native asset
pub const NATIVE_ASSET_SYMBOL: &str = "XLM";

/// One normalized page of payments
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Items in upstream order (newest first)
    pub items: Vec<PaymentItem>,
    /// Paging token of the last raw record upstream returned, before any
    /// filtering; `None` when the page was empty
    pub next_cursor: Option<String>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
