//! PostgreSQL implementation of the counter snapshot repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use super::{DEFAULT_DURABLE_TIMEOUT, with_deadline};
use crate::domain::entities::CounterSnapshot;
use crate::domain::repositories::CounterRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct CounterRow {
    counter: i64,
    updated_at: DateTime<Utc>,
}

impl From<CounterRow> for CounterSnapshot {
    fn from(r: CounterRow) -> Self {
        CounterSnapshot {
            counter: r.counter,
            updated_at: r.updated_at,
        }
    }
}

/// Stores the snapshot in the single-row `short_code_counter` table.
pub struct PgCounterRepository {
    pool: Arc<PgPool>,
    timeout: Duration,
}

impl PgCounterRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            timeout: DEFAULT_DURABLE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CounterRepository for PgCounterRepository {
    async fn find(&self) -> Result<Option<CounterSnapshot>, AppError> {
        let row = with_deadline(
            self.timeout,
            "counter_find",
            sqlx::query_as::<_, CounterRow>(
                "SELECT counter, updated_at FROM short_code_counter WHERE id = 1",
            )
            .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_if_absent(&self, initial: i64) -> Result<CounterSnapshot, AppError> {
        with_deadline(
            self.timeout,
            "counter_create",
            sqlx::query(
                "INSERT INTO short_code_counter (id, counter, updated_at) \
                 VALUES (1, $1, NOW()) \
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(initial)
            .execute(self.pool.as_ref()),
        )
        .await?;

        let row = with_deadline(
            self.timeout,
            "counter_find",
            sqlx::query_as::<_, CounterRow>(
                "SELECT counter, updated_at FROM short_code_counter WHERE id = 1",
            )
            .fetch_one(self.pool.as_ref()),
        )
        .await?;

        Ok(row.into())
    }

    async fn upsert(&self, counter: i64) -> Result<(), AppError> {
        with_deadline(
            self.timeout,
            "counter_upsert",
            sqlx::query(
                "INSERT INTO short_code_counter (id, counter, updated_at) \
                 VALUES (1, $1, NOW()) \
                 ON CONFLICT (id) DO UPDATE \
                 SET counter = EXCLUDED.counter, updated_at = EXCLUDED.updated_at",
            )
            .bind(counter)
            .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(())
    }
}
