//! `menuscan-config`: runtime configuration for the menuscan service.
//!
//! Provides:
//! - Typed settings read from environment variables
//! - Validation report with errors and warnings
//! - Redacted snapshots for safe logging

pub mod redact;
pub mod schema;
pub mod validation;

pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    ConfigError, Environment, ServiceConfig, VisionProviderKind, VisionSettings, MAX_LIFETIME_DAYS,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

/// Validate settings and log every finding.
///
/// Call this after the logger is installed. Errors stay in the report so the
/// caller can refuse to start.
pub fn validate_and_log(config: &ServiceConfig) -> ValidationReport {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    report
}
