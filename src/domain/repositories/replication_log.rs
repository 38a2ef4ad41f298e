//! Append-only replication log trait.

use crate::domain::entities::{LogEntry, ReplicationRecord};
use crate::error::AppError;
use async_trait::async_trait;

/// Ordered, at-least-once log of counter increments.
///
/// Consumers read through a consumer group: an entry stays pending until it
/// is acknowledged, and pending entries are delivered again on the next read.
///
/// # Implementations
///
/// - [`crate::infrastructure::redis::RedisReplicationLog`] - Redis stream with a consumer group
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplicationLog: Send + Sync {
    /// Appends a record to the tail of the log.
    async fn append(&self, record: &ReplicationRecord) -> Result<(), AppError>;

    /// Reads up to `max` entries for this consumer.
    ///
    /// Entries already delivered but not acknowledged are returned first;
    /// new entries are read only when nothing is pending.
    async fn read_pending(&self, max: usize) -> Result<Vec<LogEntry>, AppError>;

    /// Acknowledges an entry so it is not delivered again.
    async fn ack(&self, id: &str) -> Result<(), AppError>;
}
