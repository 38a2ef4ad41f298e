//! Handler for short URL redirect.

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::api::dto::url::RedirectQuery;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /urls/{short_code}?use_cache=false`
///
/// # Request Flow
///
/// 1. Unless `use_cache=false`, look the code up in the cache
/// 2. On a miss, load the mapping from the durable store
/// 3. Expired mappings are deleted and reported as not found
/// 4. Refill the cache and return `301 Moved Permanently`
///
/// Cache errors fall back to the durable store.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist or has expired.
pub async fn redirect_handler(
    Path(short_code): Path<String>,
    Query(query): Query<RedirectQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let original_url = state
        .url_service
        .get_original_url(&short_code, query.use_cache())
        .await?;

    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, original_url)],
    ))
}
