//! Route configuration and setup.
//!
//! Health checks live in [health](health).

mod health;

use crate::constants::{DOWNLOAD_PATH, HEALTH_PATH, UPLOAD_PATH};
use crate::handlers;
use crate::middleware::request_id_middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use photodrop_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let app = Router::new()
        .route(UPLOAD_PATH, post(handlers::upload_file))
        .route(
            DOWNLOAD_PATH,
            get(handlers::download_file).head(handlers::head_file),
        )
        .route(HEALTH_PATH, get(health::health_check))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static("content-disposition"),
            HeaderName::from_static("x-request-id"),
        ]);

    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::debug!("CORS configured to allow all origins");
        return Ok(cors.allow_origin(Any));
    }

    let origins = config
        .cors_origins()
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {:?}", o))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cors.allow_origin(origins))
}
