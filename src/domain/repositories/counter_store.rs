//! Fast-tier counter store trait.

use crate::error::AppError;
use async_trait::async_trait;

/// Low-latency integer store with an atomic increment primitive.
///
/// Uniqueness of generated short codes rests entirely on [`incr`] being
/// atomic across every process that shares the store.
///
/// [`incr`]: CounterStore::incr
///
/// # Implementations
///
/// - [`crate::infrastructure::redis::RedisCounterStore`] - Redis `INCR`/`GET`/`SET`/`SET NX`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments `key` and returns the new value.
    ///
    /// A missing key is treated as 0.
    async fn incr(&self, key: &str) -> Result<i64, AppError>;

    /// Reads the current value of `key`, or `None` if it is absent.
    async fn get(&self, key: &str) -> Result<Option<i64>, AppError>;

    /// Overwrites `key` with `value`, without expiry.
    async fn set(&self, key: &str, value: i64) -> Result<(), AppError>;

    /// Writes `value` only if `key` does not exist. Returns whether it wrote.
    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, AppError>;

    /// Checks if the store is reachable.
    async fn health_check(&self) -> bool;
}
