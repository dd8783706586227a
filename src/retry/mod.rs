// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Bounded retries against the ledger source
//!
//! [`RetryPolicy`] describes the attempt budget and the delay between attempts;
//! [`FetchRetryEngine`] drives one query through it:
//!
//! - 4xx responses (other than 429) abort immediately and leave no trace in the
//!   backoff tracker
//! - 429, 5xx and transport failures are retried until the budget is spent,
//!   each one recorded against the query's key
//! - A successful page is normalized, cached, and clears the key's backoff
//!   history

mod engine;
mod policy;

pub use engine::FetchRetryEngine;
pub(crate) use policy::exponential_delay;
pub use policy::{Jitter, RetryPolicy, RetryPolicyBuilder};
