// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for cache metadata
//!
//! - [`AccessSequence`]: Monotonic sequence number for deterministic LRU ordering
//!
//! Entry ages are tracked with [`tokio::time::Instant`] rather than wall-clock
//! timestamps, so expiry and backoff windows follow the runtime clock (and can
//! be driven with paused time in tests).

/// Monotonic sequence number for deterministic LRU ordering
///
/// When multiple entries are touched at the same instant, this sequence
/// number provides a deterministic tie-breaker for LRU eviction. Lower
/// sequence numbers are considered older.
///
/// # Examples
///
/// ```
/// use paymentscan::AccessSequence;
///
/// let seq1 = AccessSequence::default();
/// let seq2 = seq1.next();
/// assert!(seq1 < seq2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct AccessSequence(u64);

impl AccessSequence {
    /// Returns the next sequence number
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the current sequence number and advances the counter
    pub(crate) fn advance(&mut self) -> Self {
        let current = *self;
        *self = current.next();
        current
    }
}
