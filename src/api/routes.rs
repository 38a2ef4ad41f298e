//! API route configuration.

use crate::api::handlers::{
    create_url_handler, get_alias_handler, list_user_urls_handler, redirect_handler,
    update_url_handler,
};
use crate::api::middleware::rate_limit::RateLimitLayer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Short URL routes.
///
/// # Endpoints
///
/// - `POST  /urls`                 - Create a short URL (rate limited)
/// - `GET   /urls/{short_code}`    - 301 redirect to the original URL
/// - `PATCH /urls/{short_code}`    - Update target / expiry (owner only)
/// - `GET   /aliases/{alias}`      - Mapping behind a custom alias
/// - `GET   /users/{user_id}/urls` - List a user's short URLs
///
/// `rate_limit` is `None` in tests, where requests carry no peer address.
pub fn url_routes(rate_limit: Option<RateLimitLayer>) -> Router<AppState> {
    let create = match rate_limit {
        Some(layer) => post(create_url_handler).layer(layer),
        None => post(create_url_handler),
    };

    Router::new()
        .route("/urls", create)
        .route(
            "/urls/{short_code}",
            get(redirect_handler).patch(update_url_handler),
        )
        .route("/aliases/{alias}", get(get_alias_handler))
        .route("/users/{user_id}/urls", get(list_user_urls_handler))
}
