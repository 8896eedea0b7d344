mod config;
mod error;
mod handlers;
mod models;
mod photo;
mod storage;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::Config;
pub use error::{AppError, Result};
use storage::Storage;

pub struct AppState {
    pub config: Config,
    pub storage: Storage,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config
    let config = Config::from_env()?;
    let storage = Storage::from_config(&config)?;
    tracing::info!(
        storage = %storage.describe(),
        origins = ?config.cors_allowed_origins,
        "Configured photo storage"
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        storage,
    });

    let app = router(state);

    let addr = config.addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);
    let body_limit = state.config.max_request_body_bytes();

    Router::new()
        .route("/", get(handlers::root))
        // Health checks
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::api_health))
        // Photo upload from the camera capture page
        .route("/upload-photo", post(handlers::upload::upload_photo))
        .route("/photos/*key", get(handlers::photos::get_photo))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for the configured front-end origins.
///
/// Browsers refuse `*` together with credentials, so methods and headers
/// mirror whatever the preflight asks for.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| {
            if origin == "*" {
                tracing::warn!("Ignoring wildcard CORS origin; credentials are enabled");
                return None;
            }
            origin
                .parse::<HeaderValue>()
                .map_err(|e| tracing::warn!("Ignoring invalid CORS origin {:?}: {}", origin, e))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
