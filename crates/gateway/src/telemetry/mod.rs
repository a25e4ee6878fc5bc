//! Structured logging and optional OpenTelemetry span export.
//!
//! # Telemetry invariants
//!
//! - **No plaintext, envelope contents or key material** may appear in any span
//!   attribute or log field. Sizes, key ids and entity names are allowed.
//! - Log level is configurable via `CRYPTOSPHERE_LOG_LEVEL` (default: `info`),
//!   overridden by `RUST_LOG` when set.

pub mod init;

pub use init::init_telemetry;
