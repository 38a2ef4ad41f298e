//! Caller identity extraction from HTTP request headers.

use axum::http::HeaderMap;

use crate::AppError;

/// Header carrying the authenticated user id, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// User id assigned to requests that carry no identity header.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Extracts the owning user id from request headers.
///
/// Falls back to [`ANONYMOUS_USER`] when the header is absent or blank.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the header value is not valid UTF-8
/// or longer than 128 characters.
pub fn extract_user_from_headers(headers: &HeaderMap) -> Result<String, AppError> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(ANONYMOUS_USER.to_string());
    };

    let user_id = value
        .to_str()
        .map_err(|_| AppError::bad_request("Invalid X-User-Id header", serde_json::json!({})))?
        .trim();

    if user_id.is_empty() {
        return Ok(ANONYMOUS_USER.to_string());
    }

    if user_id.len() > 128 {
        return Err(AppError::bad_request(
            "X-User-Id header is too long",
            serde_json::json!({ "max_length": 128 }),
        ));
    }

    Ok(user_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_user_present() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("user-42"));

        assert_eq!(extract_user_from_headers(&headers).unwrap(), "user-42");
    }

    #[test]
    fn test_extract_user_missing_is_anonymous() {
        let headers = HeaderMap::new();
        assert_eq!(extract_user_from_headers(&headers).unwrap(), ANONYMOUS_USER);
    }

    #[test]
    fn test_extract_user_blank_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));

        assert_eq!(extract_user_from_headers(&headers).unwrap(), ANONYMOUS_USER);
    }

    #[test]
    fn test_extract_user_too_long() {
        let mut headers = HeaderMap::new();
        let long = "u".repeat(129);
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&long).unwrap());

        assert!(extract_user_from_headers(&headers).is_err());
    }
}
