//! Config validation with field-level messages.

use crate::schema::{ServiceConfig, MAX_LIFETIME_DAYS};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Everything found wrong with a config in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &ServiceConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_vision(config, &mut report);
    validate_limits(config, &mut report);
    validate_auth(config, &mut report);
    report
}

fn validate_vision(config: &ServiceConfig, report: &mut ValidationReport) {
    let vision = &config.vision;
    if vision.api_key.is_none() {
        report.error(
            vision.provider.api_key_var(),
            format!("An API key is required for the '{}' vision provider", vision.provider),
        );
    }
    if vision.timeout_secs == 0 {
        report.error("VISION_TIMEOUT_SECS", "Timeout must be > 0");
    }
    if let Some(url) = &vision.base_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            report.error("VISION_BASE_URL", format!("'{url}' is not an http(s) URL"));
        }
    }
}

fn validate_limits(config: &ServiceConfig, report: &mut ValidationReport) {
    if config.max_upload_bytes == 0 {
        report.error("MAX_UPLOAD_BYTES", "Upload size limit must be > 0");
    }
    if config.max_upload_files == 0 {
        report.error("MAX_UPLOAD_FILES", "At least one image per upload must be allowed");
    }
    if config.max_concurrent_extractions == 0 {
        report.error("MAX_CONCURRENT_EXTRACTIONS", "Must be >= 1");
    }
    if config.port < 1024 && config.port != 80 && config.port != 443 {
        report.warn(
            "MENUSCAN_PORT",
            format!(
                "Port {} requires elevated privileges; consider using a port >= 1024",
                config.port
            ),
        );
    }
}

fn validate_auth(config: &ServiceConfig, report: &mut ValidationReport) {
    let lifetime = format!("must be between 1 and {MAX_LIFETIME_DAYS} days");
    if !(1..=MAX_LIFETIME_DAYS).contains(&config.jwt_expire_days) {
        report.error("JWT_EXPIRE_DAYS", format!("Token lifetime {lifetime}"));
    }
    if !(1..=MAX_LIFETIME_DAYS).contains(&config.jwt_cookie_expire_days) {
        report.error("JWT_COOKIE_EXPIRE_DAYS", format!("Cookie lifetime {lifetime}"));
    }
    match (&config.jwt_secret, config.is_production()) {
        (None, true) => report.error("JWT_SECRET", "JWT_SECRET must be set in production"),
        (None, false) => report.warn(
            "JWT_SECRET",
            "JWT_SECRET is unset; using the development signing secret",
        ),
        (Some(secret), true) if secret.len() < 16 => {
            report.warn("JWT_SECRET", "Signing secret is shorter than 16 characters")
        }
        _ => {}
    }
}
