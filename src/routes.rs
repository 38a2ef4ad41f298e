//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `/urls/*`, `/users/*` - Short URL API (see [`crate::api::routes`])
//! - `GET /health`         - Health check: database, counter, cache
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on `POST /urls`
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{rate_limit::RateLimitLayer, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `rate_limit` - limiter for URL creation, see
///   [`crate::api::middleware::rate_limit::layer`]
pub fn app_router(state: AppState, rate_limit: Option<RateLimitLayer>) -> NormalizePath<Router> {
    let router = Router::new()
        .merge(api::routes::url_routes(rate_limit))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
