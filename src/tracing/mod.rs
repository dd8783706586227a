//! Observability and tracing utilities.
//!
//! This module provides structured tracing support for paymentscan operations.
//! The crate only emits spans and events; installing a subscriber is up to the
//! embedding application.

pub(crate) mod spans;

// Note: All span functions are internal (pub(crate)) and not re-exported
