//! Axum middleware settings applied to the router.
//!
//! Includes request tracing, timeout enforcement, and response compression.

use std::time::Duration;

/// Default per-request timeout applied to all routes.
///
/// A timed-out request never returns a partial envelope; the blocking codec
/// call finishes in the background and its result is dropped.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
