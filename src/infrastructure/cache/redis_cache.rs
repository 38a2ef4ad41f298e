//! Redis-backed cache implementation.

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Redis cache implementation for fast redirect lookups.
///
/// Shares the process-wide `ConnectionManager` with the counter store.
/// All operations are fail-open: errors are logged but don't propagate to callers.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: Duration,
    key_prefix: String,
}

impl RedisCache {
    /// Creates a cache on top of an established connection.
    ///
    /// # Arguments
    ///
    /// - `client` - Connection manager (see [`crate::infrastructure::redis::connect`])
    /// - `default_ttl` - TTL applied when [`CacheService::set_url`] is called
    ///   with `ttl = None`; controlled via `CACHE_TTL_SECONDS`
    pub fn new(client: ConnectionManager, default_ttl: Duration) -> Self {
        Self {
            client,
            default_ttl,
            key_prefix: "url:".to_string(),
        }
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, short_code: &str) -> String {
        format!("{}{}", self.key_prefix, short_code)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let key = self.build_key(short_code);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(url)) => {
                debug!("Cache HIT: {} -> {}", short_code, url);
                Ok(Some(url))
            }
            Ok(None) => {
                debug!("Cache MISS: {}", short_code);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", short_code, e);
                Ok(None)
            }
        }
    }

    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let ttl_ms = ttl.unwrap_or(self.default_ttl).as_millis() as u64;
        if ttl_ms == 0 {
            debug!("Cache SET skipped for {}: entry already expired", short_code);
            return Ok(());
        }

        let key = self.build_key(short_code);
        let mut conn = self.client.clone();

        match conn
            .pset_ex::<_, _, ()>(&key, original_url, ttl_ms)
            .await
        {
            Ok(_) => {
                debug!(
                    "Cache SET: {} -> {} (TTL: {}ms)",
                    short_code, original_url, ttl_ms
                );
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", short_code, e);
                Ok(())
            }
        }
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        let key = self.build_key(short_code);
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: {}", short_code);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Redis DEL error for {}: {}", short_code, e);
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
