//! `menuscan serve`: wire the service together and run it until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use menuscan_config::{ServiceConfig, VisionProviderKind, VisionSettings};
use menuscan_extraction::MenuExtractor;
use menuscan_gateway::{start_server, CookieSettings, GatewayState};
use menuscan_media::{ImageStore, UploadPolicy};
use menuscan_security::TokenKeys;
use menuscan_store::SqliteStore;
use menuscan_understanding::{HttpVisionClient, VisionProvider};

pub async fn run(config: ServiceConfig) -> Result<()> {
    let _log_guard = menuscan_logging::init_logger(&config.log_dir, &config.log_level, config.log_json);

    let report = menuscan_config::validate_and_log(&config);
    if !report.is_valid() {
        bail!("refusing to start with {} config error(s)", report.errors.len());
    }
    info!(config = %config.redacted(), "Starting menuscan");

    let store = Arc::new(
        SqliteStore::open(&config.db_path)
            .with_context(|| format!("Failed to open database {}", config.db_path.display()))?,
    );

    let provider = vision_provider(&config.vision)?;
    info!(provider = provider.name(), model = provider.model(), "Vision provider configured");
    let client = HttpVisionClient::new(provider, Duration::from_secs(config.vision.timeout_secs))?;
    let extractor = MenuExtractor::new(Arc::new(client));

    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET not set, signing sessions with the development secret");
    }
    let tokens = TokenKeys::new(config.jwt_secret_or_default(), config.jwt_expire_days);

    let state = GatewayState::new(store, extractor, tokens, ImageStore::new(&config.upload_dir))
        .with_upload_policy(UploadPolicy {
            max_file_bytes: config.max_upload_bytes,
            max_files: config.max_upload_files,
        })
        .with_max_concurrent_extractions(config.max_concurrent_extractions)
        .with_cookie(CookieSettings {
            ttl_days: config.jwt_cookie_expire_days,
            secure: config.is_production(),
        });

    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.listen_addr()))?;

    start_server(addr, state, shutdown_signal()).await
}

fn vision_provider(settings: &VisionSettings) -> Result<VisionProvider> {
    let Some(api_key) = settings.api_key.as_deref() else {
        bail!("{} is not set", settings.provider.api_key_var());
    };
    let mut provider = match settings.provider {
        VisionProviderKind::OpenAI => VisionProvider::openai(api_key),
        VisionProviderKind::Gemini => VisionProvider::gemini(api_key),
    };
    if let Some(model) = &settings.model {
        provider = provider.with_model(model);
    }
    if let Some(url) = &settings.base_url {
        provider = provider.with_base_url(url);
    }
    Ok(provider)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
