//! Redis fast-tier implementations.
//!
//! - [`RedisCounterStore`] - Atomic counter via `INCR`
//! - [`RedisReplicationLog`] - Replication log on a stream with a consumer group
//!
//! Both share one [`ConnectionManager`] with the cache (see [`connect`]).

mod counter_store;
mod replication_log;

pub use counter_store::RedisCounterStore;
pub use replication_log::RedisReplicationLog;

use redis::{AsyncCommands, Client, RedisError, aio::ConnectionManager};
use tracing::info;

/// Opens a managed connection and validates it with a PING.
///
/// The returned manager reconnects transparently and is cheap to clone.
///
/// # Errors
///
/// Returns the underlying [`RedisError`] if the URL is invalid, the
/// connection cannot be established, or the PING fails.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let client = Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;

    let mut test_conn = manager.clone();
    test_conn.ping::<()>().await?;

    info!("✓ Connected to Redis");
    Ok(manager)
}
