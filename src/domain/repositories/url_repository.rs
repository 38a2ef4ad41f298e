//! Repository trait for URL mapping data access.

use crate::domain::entities::{NewUrlMapping, UrlMapping, UrlMappingPatch};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for persisting short-code mappings.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Inserts a new mapping.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code or alias already exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_mapping: NewUrlMapping) -> Result<UrlMapping, AppError>;

    /// Finds a mapping by its short code.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlMapping>, AppError>;

    /// Finds a mapping by its alias.
    async fn find_by_alias(&self, alias: &str) -> Result<Option<UrlMapping>, AppError>;

    /// Returns true if a mapping with this short code exists.
    async fn exists(&self, short_code: &str) -> Result<bool, AppError>;

    /// Lists all mappings owned by a user, newest first.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<UrlMapping>, AppError>;

    /// Applies a partial update and bumps `updated_at`.
    ///
    /// Returns `Ok(None)` if no mapping matches `short_code`.
    async fn update(
        &self,
        short_code: &str,
        patch: UrlMappingPatch,
    ) -> Result<Option<UrlMapping>, AppError>;

    /// Deletes a mapping. Returns `Ok(true)` if a row was removed.
    async fn delete(&self, short_code: &str) -> Result<bool, AppError>;

    /// Deletes every mapping whose expiry has passed. Returns the number removed.
    async fn delete_expired(&self) -> Result<u64, AppError>;
}
