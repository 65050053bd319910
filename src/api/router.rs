//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//!
//! Middleware stack (outermost → innermost):
//! 1. Access log → 2. Preflight status → 3. CORS

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::config::MAX_BODY_BYTES;
use crate::core_state::CoreState;

/// Build the API router over shared, read-only state.
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Any origin, no credentials.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

fn build_router(ctx: ApiContext) -> Router {
    // Layers are applied from bottom (innermost) to top (outermost).
    Router::new()
        .route("/", get(endpoints::health::check))
        .route("/symptoms", get(endpoints::symptoms::list))
        .route(
            "/predict",
            post(endpoints::predict::predict)
                .options(endpoints::predict::preflight)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(ctx)
        .layer(cors_layer())
        .layer(axum::middleware::from_fn(middleware::preflight::no_content))
        .layer(axum::middleware::from_fn(middleware::access_log::log_access))
}
