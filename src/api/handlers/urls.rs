//! Handlers for creating, updating and listing short URLs.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use validator::Validate;

use crate::api::dto::url::{
    CreateUrlRequest, CreateUrlResponse, UpdateUrlRequest, UrlMappingResponse, UserUrlsResponse,
};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::extract_user::extract_user_from_headers;

/// Creates a short URL.
///
/// # Endpoint
///
/// `POST /urls`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "alias": "my-link",        // optional
///   "expiration_ms": 86400000  // optional
/// }
/// ```
///
/// The owner is taken from the `X-User-Id` header (default `anonymous`).
///
/// # Response
///
/// `201 Created` with `{"short_code": "..."}`.
///
/// # Errors
///
/// - 400 for an invalid URL, alias or expiration
/// - 409 if the alias is already taken
/// - 500 if the counter or the durable store is unavailable
pub async fn create_url_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<CreateUrlResponse>), AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let user_id = extract_user_from_headers(&headers)?;
    let mapping = state
        .url_service
        .create_short_url(payload.into_command(user_id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUrlResponse {
            short_code: mapping.short_code,
        }),
    ))
}

/// Updates the target and/or expiry of a short URL.
///
/// # Endpoint
///
/// `PATCH /urls/{short_code}`
///
/// Only the owner (`X-User-Id`) may update a mapping; anyone else gets 404.
pub async fn update_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateUrlRequest>,
) -> Result<Json<UrlMappingResponse>, AppError> {
    payload.validate()?;

    let user_id = extract_user_from_headers(&headers)?;
    let updated = state
        .url_service
        .update_url(&short_code, payload.into(), &user_id)
        .await?;

    Ok(Json(updated.into()))
}

/// Returns the mapping behind a custom alias without redirecting.
///
/// # Endpoint
///
/// `GET /aliases/{alias}`
///
/// Expired mappings are removed and reported as 404.
pub async fn get_alias_handler(
    Path(alias): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UrlMappingResponse>, AppError> {
    let mapping = state.url_service.get_by_alias(&alias).await?;
    Ok(Json(mapping.into()))
}

/// Lists the live short URLs owned by a user, newest first.
///
/// # Endpoint
///
/// `GET /users/{user_id}/urls`
pub async fn list_user_urls_handler(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserUrlsResponse>, AppError> {
    let urls: Vec<UrlMappingResponse> = state
        .url_service
        .list_user_urls(&user_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(UserUrlsResponse {
        user_id,
        total: urls.len(),
        urls,
    }))
}
