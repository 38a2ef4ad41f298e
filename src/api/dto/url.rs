//! DTOs for the short URL endpoints.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::application::services::{CreateUrl, UpdateUrl};
use crate::domain::entities::UrlMapping;

/// Characters allowed in a custom alias.
static ALIAS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").unwrap());

/// Request body for `POST /urls`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUrlRequest {
    /// URL to shorten. A missing scheme defaults to `https://`.
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    /// Custom short code. An empty string is treated as absent.
    #[validate(length(min = 3, max = 20, message = "Alias must be between 3 and 20 characters"))]
    #[validate(regex(path = *ALIAS_REGEX, message = "Alias may only contain letters, digits and hyphens"))]
    pub alias: Option<String>,

    /// Lifetime in milliseconds; `<= 0` or absent means the link never expires.
    pub expiration_ms: Option<i64>,
}

impl CreateUrlRequest {
    /// Drops an empty alias so it is not validated as a custom code.
    pub fn normalized(mut self) -> Self {
        self.alias = self.alias.filter(|a| !a.is_empty());
        self
    }

    pub fn into_command(self, user_id: String) -> CreateUrl {
        CreateUrl {
            url: self.url,
            alias: self.alias,
            expiration_ms: self.expiration_ms,
            user_id,
        }
    }
}

/// Response for `POST /urls`.
#[derive(Debug, Serialize)]
pub struct CreateUrlResponse {
    pub short_code: String,
}

/// Request body for `PATCH /urls/{short_code}`.
///
/// # `expiration_ms` semantics
///
/// - **Absent** → leave existing expiry unchanged
/// - **`null`** or `<= 0` → clear expiry
/// - **Positive** → expire that many milliseconds from now
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUrlRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expiration_ms: Option<Option<i64>>,
}

impl From<UpdateUrlRequest> for UpdateUrl {
    fn from(r: UpdateUrlRequest) -> Self {
        UpdateUrl {
            url: r.url,
            expiration_ms: r.expiration_ms,
        }
    }
}

/// A mapping as returned by the API.
#[derive(Debug, Serialize)]
pub struct UrlMappingResponse {
    pub short_code: String,
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
}

impl From<UrlMapping> for UrlMappingResponse {
    fn from(m: UrlMapping) -> Self {
        Self {
            short_code: m.short_code,
            original_url: m.original_url,
            alias: m.alias,
            expires_at: m.expires_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
            user_id: m.user_id,
        }
    }
}

/// Response for `GET /users/{user_id}/urls`.
#[derive(Debug, Serialize)]
pub struct UserUrlsResponse {
    pub user_id: String,
    pub total: usize,
    pub urls: Vec<UrlMappingResponse>,
}

/// Query string of `GET /urls/{short_code}`.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub use_cache: Option<String>,
}

impl RedirectQuery {
    /// Only an explicit `false`/`f`/`0`/`no`/`off` disables the cache.
    pub fn use_cache(&self) -> bool {
        match self.use_cache.as_deref().map(str::trim) {
            Some(v) => !matches!(
                v.to_ascii_lowercase().as_str(),
                "false" | "f" | "0" | "no" | "off"
            ),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(value: Option<&str>) -> RedirectQuery {
        RedirectQuery {
            use_cache: value.map(str::to_string),
        }
    }

    #[test]
    fn test_use_cache_defaults_to_true() {
        assert!(query(None).use_cache());
        assert!(query(Some("true")).use_cache());
        assert!(query(Some("maybe")).use_cache());
        assert!(query(Some("")).use_cache());
    }

    #[test]
    fn test_use_cache_can_be_disabled() {
        assert!(!query(Some("false")).use_cache());
        assert!(!query(Some("FALSE")).use_cache());
        assert!(!query(Some("0")).use_cache());
        assert!(!query(Some("off")).use_cache());
        assert!(!query(Some("f")).use_cache());
        assert!(!query(Some("F")).use_cache());
    }

    #[test]
    fn test_create_request_validation() {
        let ok: CreateUrlRequest = serde_json::from_value(json!({
            "url": "https://example.com",
            "alias": "my-link"
        }))
        .unwrap();
        assert!(ok.validate().is_ok());

        let bad_chars: CreateUrlRequest = serde_json::from_value(json!({
            "url": "https://example.com",
            "alias": "my link!"
        }))
        .unwrap();
        assert!(bad_chars.validate().is_err());

        let too_short: CreateUrlRequest = serde_json::from_value(json!({
            "url": "https://example.com",
            "alias": "ab"
        }))
        .unwrap();
        assert!(too_short.validate().is_err());
    }

    #[test]
    fn test_empty_alias_is_dropped() {
        let req: CreateUrlRequest = serde_json::from_value(json!({
            "url": "https://example.com",
            "alias": ""
        }))
        .unwrap();

        let req = req.normalized();
        assert!(req.alias.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_request_expiration_semantics() {
        let absent: UpdateUrlRequest = serde_json::from_value(json!({ "url": "x.com" })).unwrap();
        assert_eq!(absent.expiration_ms, None);

        let cleared: UpdateUrlRequest =
            serde_json::from_value(json!({ "expiration_ms": null })).unwrap();
        assert_eq!(cleared.expiration_ms, Some(None));

        let set: UpdateUrlRequest =
            serde_json::from_value(json!({ "expiration_ms": 5000 })).unwrap();
        assert_eq!(set.expiration_ms, Some(Some(5000)));
    }
}
