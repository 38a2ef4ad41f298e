//! Redis implementation of the fast-tier counter store.

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::debug;

use crate::domain::repositories::CounterStore;
use crate::error::AppError;

/// Counter store backed by Redis integer keys.
///
/// `INCR` is atomic on the server, so any number of service instances may
/// share the same key without application-level locking.
pub struct RedisCounterStore {
    client: ConnectionManager,
}

impl RedisCounterStore {
    pub fn new(client: ConnectionManager) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr(&self, key: &str) -> Result<i64, AppError> {
        let mut conn = self.client.clone();
        let value: i64 = conn.incr(key, 1).await?;
        debug!("INCR {} -> {}", key, value);
        Ok(value)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, AppError> {
        let mut conn = self.client.clone();
        Ok(conn.get::<_, Option<i64>>(key).await?)
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), AppError> {
        let mut conn = self.client.clone();
        conn.set::<_, _, ()>(key, value).await?;
        debug!("SET {} = {}", key, value);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, AppError> {
        let mut conn = self.client.clone();
        let written: bool = conn.set_nx(key, value).await?;
        debug!("SETNX {} = {} -> {}", key, value, written);
        Ok(written)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
