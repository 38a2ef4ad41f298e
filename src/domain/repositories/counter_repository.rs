//! Repository trait for the durable counter snapshot.

use crate::domain::entities::CounterSnapshot;
use crate::error::AppError;
use async_trait::async_trait;

/// Durable storage for the single counter snapshot.
///
/// Exactly one snapshot exists per deployment. Writes are last-write-wins:
/// no ordering check is made against the stored value.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgCounterRepository`] - PostgreSQL implementation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterRepository: Send + Sync {
    /// Reads the snapshot, if one has been written.
    async fn find(&self) -> Result<Option<CounterSnapshot>, AppError>;

    /// Creates the snapshot with `initial` unless one already exists.
    ///
    /// Returns the stored snapshot either way.
    async fn create_if_absent(&self, initial: i64) -> Result<CounterSnapshot, AppError>;

    /// Sets `counter` and `updated_at` unconditionally, creating the snapshot
    /// if needed.
    async fn upsert(&self, counter: i64) -> Result<(), AppError>;
}
