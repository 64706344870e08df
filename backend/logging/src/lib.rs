//! Structured logging for menuscan.
//!
//! Console plus rolling NDJSON file output, and scrubbing of credentials
//! before upstream text reaches the logs.

pub mod logger;
pub mod redact;

pub use logger::{init_logger, LogGuard};
pub use redact::redact_sensitive_data;
