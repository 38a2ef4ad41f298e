//! PostgreSQL repository implementations.
//!
//! Concrete implementations of the durable-tier repository traits using SQLx
//! runtime-checked queries.
//!
//! # Repositories
//!
//! - [`PgUrlRepository`] - URL mapping storage and retrieval
//! - [`PgCounterRepository`] - Durable counter snapshot
//!
//! Every statement runs under a deadline (`DURABLE_TIMEOUT_SECS`); a query
//! that outlives it fails with [`AppError::Internal`].

pub mod pg_counter_repository;
pub mod pg_url_repository;

pub use pg_counter_repository::PgCounterRepository;
pub use pg_url_repository::PgUrlRepository;

use serde_json::json;
use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Default deadline for a single durable-tier statement.
pub const DEFAULT_DURABLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Awaits `fut`, failing with [`AppError::Internal`] once `timeout` elapses.
pub(crate) async fn with_deadline<T, F>(
    timeout: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::error!("Durable store timed out during {}", operation);
            Err(AppError::internal(
                "Durable store timed out",
                json!({ "operation": operation, "timeout_ms": timeout.as_millis() as u64 }),
            ))
        }
    }
}
