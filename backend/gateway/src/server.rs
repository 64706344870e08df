//! Main HTTP server: shared state, routing and graceful shutdown.

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use menuscan_extraction::MenuExtractor;
use menuscan_media::{ImageStore, UploadPolicy, media_router};
use menuscan_security::TokenKeys;
use menuscan_store::{MenuStore, UserStore};

use crate::health_api;
use crate::limiter::ExtractionLimiter;
use crate::{auth_api, menus};

/// Token cookie attributes.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub ttl_days: i64,
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            ttl_days: 30,
            secure: false,
        }
    }
}

/// Application state shared across routes. Cheap to clone.
#[derive(Clone)]
pub struct GatewayState {
    pub menus: Arc<dyn MenuStore>,
    pub users: Arc<dyn UserStore>,
    pub extractor: Arc<MenuExtractor>,
    pub tokens: TokenKeys,
    pub limiter: ExtractionLimiter,
    pub upload_policy: UploadPolicy,
    pub images: ImageStore,
    pub cookie: CookieSettings,
}

impl GatewayState {
    /// State over one backing store that holds both menus and users.
    pub fn new<S>(store: Arc<S>, extractor: MenuExtractor, tokens: TokenKeys, images: ImageStore) -> Self
    where
        S: MenuStore + UserStore + 'static,
    {
        Self {
            menus: store.clone(),
            users: store,
            extractor: Arc::new(extractor),
            tokens,
            limiter: ExtractionLimiter::default(),
            upload_policy: UploadPolicy::default(),
            images,
            cookie: CookieSettings::default(),
        }
    }

    pub fn with_upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.upload_policy = policy;
        self
    }

    pub fn with_max_concurrent_extractions(mut self, max: usize) -> Self {
        self.limiter = ExtractionLimiter::new(max);
        self
    }

    pub fn with_cookie(mut self, cookie: CookieSettings) -> Self {
        self.cookie = cookie;
        self
    }
}

/// Assemble every route with its layers.
pub fn build_router(state: GatewayState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth_api::register))
        .route("/login", post(auth_api::login))
        .route("/me", get(auth_api::me))
        .route("/updatedetails", put(auth_api::update_details))
        .route("/logout", post(auth_api::logout))
        .route(
            "/restaurants",
            get(auth_api::list_restaurants).post(auth_api::add_restaurant),
        );

    let menu_routes = Router::new()
        .route("/", post(menus::create_menu).get(menus::list_menus))
        .route(
            "/:id",
            get(menus::get_menu)
                .put(menus::update_menu)
                .delete(menus::delete_menu),
        )
        .route("/:id/images", put(menus::update_menu_images))
        .layer(DefaultBodyLimit::max(state.upload_policy.body_limit()));

    let images_dir = state.images.dir().to_path_buf();

    Router::new()
        .route("/health", get(health_api::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/menus", menu_routes)
        .with_state(state)
        .nest("/uploads/images", media_router(images_dir))
        .fallback(health_api::not_found)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve until `shutdown` resolves.
#[instrument(skip(state, shutdown))]
pub async fn start_server<F>(addr: SocketAddr, state: GatewayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    state
        .images
        .ensure_dir()
        .await
        .context("Failed to create upload directory")?;
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Gateway HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    info!("Gateway HTTP server stopped");
    Ok(())
}
