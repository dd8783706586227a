// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for type safety across paymentscan.
//!
//! This module provides the data model of the query layer:
//! - Queries, page sizes and cache keys
//! - Normalized payment items and query results
//! - Cache metadata (access sequences)

pub mod cache;
pub mod payment;
pub mod query;

// Note: Public types are re-exported from lib.rs, not here
