//! PostgreSQL implementation of the URL mapping repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use super::{DEFAULT_DURABLE_TIMEOUT, with_deadline};
use crate::domain::entities::{NewUrlMapping, UrlMapping, UrlMappingPatch};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;

const COLUMNS: &str =
    "id, short_code, original_url, alias, expires_at, created_at, updated_at, user_id";

#[derive(sqlx::FromRow)]
struct UrlMappingRow {
    id: i64,
    short_code: String,
    original_url: String,
    alias: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_id: String,
}

impl From<UrlMappingRow> for UrlMapping {
    fn from(r: UrlMappingRow) -> Self {
        UrlMapping {
            id: r.id,
            short_code: r.short_code,
            original_url: r.original_url,
            alias: r.alias,
            expires_at: r.expires_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
            user_id: r.user_id,
        }
    }
}

/// PostgreSQL repository for short-code mappings.
///
/// Uniqueness of `short_code` and `alias` is enforced by the schema; a
/// violated constraint surfaces as [`AppError::Conflict`].
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
    timeout: Duration,
}

impl PgUrlRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            timeout: DEFAULT_DURABLE_TIMEOUT,
        }
    }

    /// Overrides the per-statement deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn create(&self, new_mapping: NewUrlMapping) -> Result<UrlMapping, AppError> {
        let sql = format!(
            "INSERT INTO url_mappings (short_code, original_url, alias, expires_at, user_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );

        let row = with_deadline(
            self.timeout,
            "create",
            sqlx::query_as::<_, UrlMappingRow>(&sql)
                .bind(&new_mapping.short_code)
                .bind(&new_mapping.original_url)
                .bind(&new_mapping.alias)
                .bind(new_mapping.expires_at)
                .bind(&new_mapping.user_id)
                .fetch_one(self.pool.as_ref()),
        )
        .await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlMapping>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM url_mappings WHERE short_code = $1");

        let row = with_deadline(
            self.timeout,
            "find_by_code",
            sqlx::query_as::<_, UrlMappingRow>(&sql)
                .bind(short_code)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<UrlMapping>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM url_mappings WHERE alias = $1");

        let row = with_deadline(
            self.timeout,
            "find_by_alias",
            sqlx::query_as::<_, UrlMappingRow>(&sql)
                .bind(alias)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        Ok(row.map(Into::into))
    }

    async fn exists(&self, short_code: &str) -> Result<bool, AppError> {
        with_deadline(
            self.timeout,
            "exists",
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM url_mappings WHERE short_code = $1)",
            )
            .bind(short_code)
            .fetch_one(self.pool.as_ref()),
        )
        .await
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<UrlMapping>, AppError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM url_mappings WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );

        let rows = with_deadline(
            self.timeout,
            "list_by_user",
            sqlx::query_as::<_, UrlMappingRow>(&sql)
                .bind(user_id)
                .fetch_all(self.pool.as_ref()),
        )
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(
        &self,
        short_code: &str,
        patch: UrlMappingPatch,
    ) -> Result<Option<UrlMapping>, AppError> {
        // $3 distinguishes "leave expiry alone" from "clear expiry" (NULL $4).
        let touch_expiry = patch.expires_at.is_some();
        let expires_at = patch.expires_at.flatten();

        let sql = format!(
            "UPDATE url_mappings SET \
                original_url = COALESCE($2, original_url), \
                expires_at = CASE WHEN $3 THEN $4 ELSE expires_at END, \
                updated_at = NOW() \
             WHERE short_code = $1 \
             RETURNING {COLUMNS}"
        );

        let row = with_deadline(
            self.timeout,
            "update",
            sqlx::query_as::<_, UrlMappingRow>(&sql)
                .bind(short_code)
                .bind(&patch.original_url)
                .bind(touch_expiry)
                .bind(expires_at)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete(&self, short_code: &str) -> Result<bool, AppError> {
        let result = with_deadline(
            self.timeout,
            "delete",
            sqlx::query("DELETE FROM url_mappings WHERE short_code = $1")
                .bind(short_code)
                .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self) -> Result<u64, AppError> {
        let result = with_deadline(
            self.timeout,
            "delete_expired",
            sqlx::query("DELETE FROM url_mappings WHERE expires_at IS NOT NULL AND expires_at <= NOW()")
                .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(result.rows_affected())
    }
}
