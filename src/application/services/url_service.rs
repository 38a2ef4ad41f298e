//! Short URL creation, resolution and maintenance.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use super::ShortCodeGenerator;
use crate::domain::entities::{NewUrlMapping, UrlMapping, UrlMappingPatch};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::url_validator::{validate_alias, validate_url};

/// Generated codes tried before giving up on a create.
const MAX_GENERATE_ATTEMPTS: usize = 10;

/// Input for [`UrlService::create_short_url`].
#[derive(Debug, Clone, Default)]
pub struct CreateUrl {
    pub url: String,
    /// Used verbatim as the short code when set.
    pub alias: Option<String>,
    /// Lifetime in milliseconds; absent or `<= 0` means no expiry.
    pub expiration_ms: Option<i64>,
    pub user_id: String,
}

/// Input for [`UrlService::update_url`].
///
/// `expiration_ms: Some(None)` or a non-positive value clears the expiry.
#[derive(Debug, Clone, Default)]
pub struct UpdateUrl {
    pub url: Option<String>,
    pub expiration_ms: Option<Option<i64>>,
}

/// Service for creating and resolving short URLs.
///
/// The durable repository is the source of truth. The cache only holds
/// `short_code -> original_url` and is bypassed on any error.
pub struct UrlService {
    repository: Arc<dyn UrlRepository>,
    cache: Arc<dyn CacheService>,
    generator: ShortCodeGenerator,
}

impl UrlService {
    pub fn new(
        repository: Arc<dyn UrlRepository>,
        cache: Arc<dyn CacheService>,
        generator: ShortCodeGenerator,
    ) -> Self {
        Self {
            repository,
            cache,
            generator,
        }
    }

    /// Creates a mapping and warms the cache with it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an invalid URL, alias or
    /// expiration.
    /// Returns [`AppError::Conflict`] if the alias is already taken.
    /// Returns [`AppError::Internal`] if the counter is unavailable or every
    /// generated code collided.
    pub async fn create_short_url(&self, request: CreateUrl) -> Result<UrlMapping, AppError> {
        let original_url = validate_url(&request.url)?;
        validate_alias(request.alias.as_deref())?;
        let alias = request.alias.filter(|a| !a.is_empty());
        let expires_at = expiry_from_ms(request.expiration_ms)?;

        let mapping = match alias {
            Some(alias) => {
                if self.repository.exists(&alias).await? {
                    return Err(AppError::conflict(
                        "Alias already in use",
                        json!({ "alias": alias }),
                    ));
                }

                self.repository
                    .create(NewUrlMapping {
                        short_code: alias.clone(),
                        original_url,
                        alias: Some(alias),
                        expires_at,
                        user_id: request.user_id,
                    })
                    .await?
            }
            None => {
                self.create_with_generated_code(original_url, expires_at, request.user_id)
                    .await?
            }
        };

        info!("Created {} -> {}", mapping.short_code, mapping.original_url);
        self.cache_mapping(&mapping).await;

        Ok(mapping)
    }

    async fn create_with_generated_code(
        &self,
        original_url: String,
        expires_at: Option<DateTime<Utc>>,
        user_id: String,
    ) -> Result<UrlMapping, AppError> {
        for attempt in 1..=MAX_GENERATE_ATTEMPTS {
            let short_code = self.generator.generate().await?;

            let result = self
                .repository
                .create(NewUrlMapping {
                    short_code: short_code.clone(),
                    original_url: original_url.clone(),
                    alias: None,
                    expires_at,
                    user_id: user_id.clone(),
                })
                .await;

            match result {
                Err(AppError::Conflict { .. }) => {
                    warn!(
                        "Generated code {} already taken (attempt {}/{})",
                        short_code, attempt, MAX_GENERATE_ATTEMPTS
                    );
                }
                other => return other,
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions", "attempts": MAX_GENERATE_ATTEMPTS }),
        ))
    }

    /// Resolves a short code to its original URL.
    ///
    /// With `use_cache` the cache is consulted first and refilled on a miss.
    /// An expired mapping is removed from cache and store and reported as
    /// not found.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown or expired.
    pub async fn get_original_url(
        &self,
        short_code: &str,
        use_cache: bool,
    ) -> Result<String, AppError> {
        if use_cache {
            match self.cache.get_url(short_code).await {
                Ok(Some(url)) => return Ok(url),
                Ok(None) => {}
                Err(e) => warn!("Cache read failed for {}: {}", short_code, e),
            }
        }

        let mapping = self.find_live(short_code).await?;

        if use_cache {
            self.cache_mapping(&mapping).await;
        }

        Ok(mapping.original_url)
    }

    /// Looks up a live mapping by alias.
    pub async fn get_by_alias(&self, alias: &str) -> Result<UrlMapping, AppError> {
        let mapping = self
            .repository
            .find_by_alias(alias)
            .await?
            .ok_or_else(|| not_found(alias))?;

        if mapping.is_expired() {
            self.delete_expired_url(&mapping.short_code).await;
            return Err(not_found(alias));
        }

        Ok(mapping)
    }

    /// Changes the target and/or expiry of a mapping owned by `user_id`.
    ///
    /// Mappings owned by someone else are reported as not found.
    pub async fn update_url(
        &self,
        short_code: &str,
        update: UpdateUrl,
        user_id: &str,
    ) -> Result<UrlMapping, AppError> {
        let patch = UrlMappingPatch {
            original_url: update.url.as_deref().map(validate_url).transpose()?,
            expires_at: update.expiration_ms.map(expiry_from_ms).transpose()?,
        };

        if patch.is_empty() {
            return Err(AppError::bad_request(
                "Nothing to update",
                json!({ "fields": ["url", "expiration_ms"] }),
            ));
        }

        let existing = self.find_live(short_code).await?;
        if existing.user_id != user_id {
            debug!("User {} does not own {}", user_id, short_code);
            return Err(not_found(short_code));
        }

        let updated = self
            .repository
            .update(short_code, patch)
            .await?
            .ok_or_else(|| not_found(short_code))?;

        if let Err(e) = self.cache.invalidate(short_code).await {
            warn!("Cache invalidation failed for {}: {}", short_code, e);
        }

        info!("Updated {}", short_code);
        Ok(updated)
    }

    /// Lists the live mappings owned by `user_id`, newest first.
    pub async fn list_user_urls(&self, user_id: &str) -> Result<Vec<UrlMapping>, AppError> {
        let now = Utc::now();
        let mappings = self.repository.list_by_user(user_id).await?;

        Ok(mappings
            .into_iter()
            .filter(|m| !m.is_expired_at(now))
            .collect())
    }

    /// Removes a mapping from cache and store. Failures are only logged.
    pub async fn delete_expired_url(&self, short_code: &str) {
        if let Err(e) = self.cache.invalidate(short_code).await {
            warn!("Cache invalidation failed for {}: {}", short_code, e);
        }

        match self.repository.delete(short_code).await {
            Ok(true) => info!("Deleted expired mapping {}", short_code),
            Ok(false) => debug!("Expired mapping {} already gone", short_code),
            Err(e) => warn!("Failed to delete expired mapping {}: {}", short_code, e),
        }
    }

    /// Deletes every expired mapping from the store.
    ///
    /// Cache entries are not touched: their TTL never outlives the mapping.
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        self.repository.delete_expired().await
    }

    async fn find_live(&self, short_code: &str) -> Result<UrlMapping, AppError> {
        let mapping = self
            .repository
            .find_by_code(short_code)
            .await?
            .ok_or_else(|| not_found(short_code))?;

        if mapping.is_expired() {
            self.delete_expired_url(short_code).await;
            return Err(not_found(short_code));
        }

        Ok(mapping)
    }

    async fn cache_mapping(&self, mapping: &UrlMapping) {
        let ttl = mapping.remaining_ttl();
        if let Err(e) = self
            .cache
            .set_url(&mapping.short_code, &mapping.original_url, ttl)
            .await
        {
            warn!("Cache write failed for {}: {}", mapping.short_code, e);
        }
    }
}

fn not_found(short_code: &str) -> AppError {
    AppError::not_found("Short URL not found", json!({ "short_code": short_code }))
}

/// Converts a relative lifetime into an absolute expiry.
fn expiry_from_ms(expiration_ms: Option<i64>) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(ms) = expiration_ms.filter(|ms| *ms > 0) else {
        return Ok(None);
    };

    TimeDelta::try_milliseconds(ms)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .map(Some)
        .ok_or_else(|| {
            AppError::bad_request(
                "Expiration is out of range",
                json!({ "expiration_ms": ms }),
            )
        })
}
