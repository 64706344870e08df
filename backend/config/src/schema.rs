//! Service settings, read from environment variables.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound for token and cookie lifetimes, in days.
pub const MAX_LIFETIME_DAYS: i64 = 3650;

/// Signing secret used when `JWT_SECRET` is unset outside production.
pub const DEV_JWT_SECRET: &str = "menuscan-development-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("expected 'development' or 'production', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisionProviderKind {
    #[default]
    OpenAI,
    Gemini,
}

impl VisionProviderKind {
    /// Environment variable holding this provider's credential.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for VisionProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAI => f.write_str("openai"),
            Self::Gemini => f.write_str("gemini"),
        }
    }
}

impl FromStr for VisionProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(format!("unknown vision provider '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VisionSettings {
    pub provider: VisionProviderKind,
    /// Model override; the provider default applies when unset.
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    pub bind: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub environment: Environment,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub max_upload_files: usize,
    pub vision: VisionSettings,
    pub max_concurrent_extractions: usize,
    pub jwt_secret: Option<String>,
    pub jwt_expire_days: i64,
    pub jwt_cookie_expire_days: i64,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            db_path: PathBuf::from("menuscan.db"),
            environment: Environment::Development,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 10 * 1024 * 1024,
            max_upload_files: 10,
            vision: VisionSettings {
                provider: VisionProviderKind::OpenAI,
                model: None,
                base_url: None,
                api_key: None,
                timeout_secs: 120,
            },
            max_concurrent_extractions: 4,
            jwt_secret: None,
            jwt_expire_days: 30,
            jwt_cookie_expire_days: 30,
            log_dir: PathBuf::from("logs"),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ServiceConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Read settings from an explicit variable map. Unset or empty variables
    /// keep their defaults.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut config = Self::default();
        if let Some(bind) = get("MENUSCAN_BIND") {
            config.bind = bind;
        }
        if let Some(port) = get("MENUSCAN_PORT").or_else(|| get("PORT")) {
            config.port = parse("MENUSCAN_PORT", &port)?;
        }
        if let Some(db) = get("MENUSCAN_DB") {
            config.db_path = PathBuf::from(db);
        }
        if let Some(env) = get("MENUSCAN_ENV") {
            config.environment = parse("MENUSCAN_ENV", &env)?;
        }
        if let Some(dir) = get("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(v) = get("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse("MAX_UPLOAD_BYTES", &v)?;
        }
        if let Some(v) = get("MAX_UPLOAD_FILES") {
            config.max_upload_files = parse("MAX_UPLOAD_FILES", &v)?;
        }

        if let Some(provider) = get("VISION_PROVIDER") {
            config.vision.provider = parse("VISION_PROVIDER", &provider)?;
        }
        config.vision.model = get("VISION_MODEL");
        config.vision.base_url = get("VISION_BASE_URL");
        config.vision.api_key = get(config.vision.provider.api_key_var());
        if let Some(v) = get("VISION_TIMEOUT_SECS") {
            config.vision.timeout_secs = parse("VISION_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("MAX_CONCURRENT_EXTRACTIONS") {
            config.max_concurrent_extractions = parse("MAX_CONCURRENT_EXTRACTIONS", &v)?;
        }

        config.jwt_secret = get("JWT_SECRET");
        if let Some(v) = get("JWT_EXPIRE_DAYS") {
            config.jwt_expire_days = parse("JWT_EXPIRE_DAYS", &v)?;
        }
        if let Some(v) = get("JWT_COOKIE_EXPIRE_DAYS") {
            config.jwt_cookie_expire_days = parse("JWT_COOKIE_EXPIRE_DAYS", &v)?;
        }

        if let Some(dir) = get("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(level) = get("RUST_LOG") {
            config.log_level = level;
        }
        if let Some(v) = get("LOG_JSON") {
            config.log_json = parse_flag("LOG_JSON", &v)?;
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// The configured signing secret, or the development fallback.
    pub fn jwt_secret_or_default(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or(DEV_JWT_SECRET)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// A JSON snapshot with credentials masked.
    pub fn redacted(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(value) => crate::redact::redact(&value),
            Err(_) => serde_json::Value::Null,
        }
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = ServiceConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_upload_bytes, 10_485_760);
        assert_eq!(config.max_upload_files, 10);
        assert_eq!(config.vision.provider, VisionProviderKind::OpenAI);
        assert_eq!(config.vision.timeout_secs, 120);
        assert_eq!(config.jwt_secret_or_default(), DEV_JWT_SECRET);
        assert!(!config.is_production());
    }

    #[test]
    fn reads_overrides_and_provider_key() {
        let config = ServiceConfig::from_vars(&vars(&[
            ("PORT", "8080"),
            ("VISION_PROVIDER", "gemini"),
            ("GEMINI_API_KEY", "AIzaKey"),
            ("OPENAI_API_KEY", "sk-unused"),
            ("MENUSCAN_ENV", "production"),
            ("LOG_JSON", "true"),
            ("MAX_CONCURRENT_EXTRACTIONS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.vision.provider, VisionProviderKind::Gemini);
        assert_eq!(config.vision.api_key.as_deref(), Some("AIzaKey"));
        assert!(config.is_production());
        assert!(config.log_json);
        assert_eq!(config.max_concurrent_extractions, 2);
    }

    #[test]
    fn menuscan_port_wins_over_port() {
        let config =
            ServiceConfig::from_vars(&vars(&[("PORT", "8080"), ("MENUSCAN_PORT", "9090")])).unwrap();
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn rejects_malformed_numbers() {
        let err = ServiceConfig::from_vars(&vars(&[("MAX_UPLOAD_FILES", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "MAX_UPLOAD_FILES", .. }));
    }

    #[test]
    fn redacted_snapshot_masks_secrets() {
        let config = ServiceConfig::from_vars(&vars(&[
            ("OPENAI_API_KEY", "sk-supersecretvalue"),
            ("JWT_SECRET", "hunter2hunter2"),
        ]))
        .unwrap();
        let snapshot = config.redacted().to_string();
        assert!(!snapshot.contains("supersecretvalue"));
        assert!(!snapshot.contains("hunter2hunter2"));
        assert!(snapshot.contains("\"port\":3000"));
    }
}
