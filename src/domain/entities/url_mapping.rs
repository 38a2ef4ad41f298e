//! URL mapping entity: a short code bound to an original URL.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A persisted short-code to URL mapping.
///
/// For alias-created mappings `alias` equals `short_code`.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlMapping {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub alias: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
}

impl UrlMapping {
    /// Returns true if the mapping has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Time left until expiry.
    ///
    /// Returns `None` for mappings without an expiry and `Some(Duration::ZERO)`
    /// for mappings that already expired.
    pub fn remaining_ttl(&self) -> Option<Duration> {
        self.expires_at.map(|e| {
            (e - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO)
        })
    }
}

/// Input data for creating a new mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUrlMapping {
    pub short_code: String,
    pub original_url: String,
    pub alias: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user_id: String,
}

/// Partial update for an existing mapping.
///
/// `None` fields are left unchanged.
/// `expires_at: Some(None)` clears the expiry; `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlMappingPatch {
    pub original_url: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl UrlMappingPatch {
    pub fn is_empty(&self) -> bool {
        self.original_url.is_none() && self.expires_at.is_none()
    }
}
