//! Two-tier short-code counter.
//!
//! The fast tier (Redis `INCR`) is authoritative for allocation. Every
//! increment is appended to a replication log that a background worker
//! drains into the durable snapshot, so a cold fast tier can be reseeded.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::entities::{CounterSnapshot, ReplicationRecord, ReplicationReport};
use crate::domain::repositories::{CounterRepository, CounterStore, ReplicationLog};
use crate::error::AppError;

/// Default fast-tier key holding the counter.
pub const DEFAULT_COUNTER_KEY: &str = "short_code_counter";

/// Distributed monotonically increasing counter.
///
/// Shared as `Arc<DistributedCounter>` between request handlers and the
/// replication worker. No application-level locking is done: uniqueness
/// relies on `INCR` being atomic on the server.
pub struct DistributedCounter {
    store: Arc<dyn CounterStore>,
    log: Arc<dyn ReplicationLog>,
    durable: Arc<dyn CounterRepository>,
    key: String,
}

impl DistributedCounter {
    pub fn new(
        store: Arc<dyn CounterStore>,
        log: Arc<dyn ReplicationLog>,
        durable: Arc<dyn CounterRepository>,
    ) -> Self {
        Self {
            store,
            log,
            durable,
            key: DEFAULT_COUNTER_KEY.to_string(),
        }
    }

    /// Uses `key` instead of [`DEFAULT_COUNTER_KEY`] in the fast tier.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Allocates the next counter value.
    ///
    /// The replication append happens after the increment and never fails
    /// the call; a lost append only delays the durable snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the fast-tier increment fails.
    pub async fn get_next_counter(&self) -> Result<i64, AppError> {
        let value = self.store.incr(&self.key).await?;
        metrics::counter!("short_code_counter_increments_total").increment(1);

        let record = ReplicationRecord::new(value);
        if let Err(e) = self.log.append(&record).await {
            metrics::counter!("short_code_counter_append_failures_total").increment(1);
            warn!("Failed to append counter {} to replication log: {}", value, e);
        }

        Ok(value)
    }

    /// Reads the current value without incrementing.
    ///
    /// A missing fast-tier key (cold start) is reseeded from the durable
    /// snapshot.
    pub async fn get_current_counter(&self) -> Result<i64, AppError> {
        match self.store.get(&self.key).await? {
            Some(value) => Ok(value),
            None => {
                info!("Counter key '{}' missing, reseeding from durable store", self.key);
                self.initialize_from_durable().await
            }
        }
    }

    /// Startup bootstrap that is safe while other instances are serving.
    ///
    /// Creates the durable snapshot at 0 if absent and seeds the fast tier
    /// from it only when the key does not exist yet. A live fast-tier value
    /// is never touched. Returns whether the fast tier was seeded.
    pub async fn bootstrap(&self) -> Result<bool, AppError> {
        let snapshot = self.durable.create_if_absent(0).await?;
        let seeded = self.store.set_if_absent(&self.key, snapshot.counter).await?;

        if seeded {
            info!(
                "Counter '{}' seeded to {} (durable snapshot from {})",
                self.key, snapshot.counter, snapshot.updated_at
            );
        } else {
            info!(
                "Counter '{}' already live in fast tier, durable snapshot at {}",
                self.key, snapshot.counter
            );
        }
        Ok(seeded)
    }

    /// Forced re-initialization.
    ///
    /// Creates the durable snapshot at 0 if absent, then overwrites the fast
    /// tier with the durable value. Calling this while increments are in
    /// flight may move the fast tier backwards; the server uses
    /// [`bootstrap`](Self::bootstrap) instead.
    pub async fn initialize_counter(&self) -> Result<(), AppError> {
        let snapshot = self.durable.create_if_absent(0).await?;
        self.store.set(&self.key, snapshot.counter).await?;

        info!(
            "Counter '{}' initialized to {} (durable snapshot from {})",
            self.key, snapshot.counter, snapshot.updated_at
        );
        Ok(())
    }

    async fn initialize_from_durable(&self) -> Result<i64, AppError> {
        match self.durable.find().await? {
            None => {
                self.initialize_counter().await?;
                Ok(0)
            }
            Some(snapshot) => {
                self.store.set(&self.key, snapshot.counter).await?;
                Ok(snapshot.counter)
            }
        }
    }

    /// Reads the durable snapshot.
    pub async fn durable_snapshot(&self) -> Result<Option<CounterSnapshot>, AppError> {
        self.durable.find().await
    }

    /// Runs one drain pass over the replication log.
    ///
    /// Entries without a parseable counter are acknowledged and dropped.
    /// The pass stops at the first failed upsert; that entry and every
    /// later one stay pending and are redelivered in log order.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading the log fails.
    pub async fn replicate_pending(&self, batch_size: usize) -> Result<ReplicationReport, AppError> {
        let entries = self.log.read_pending(batch_size).await?;
        let mut report = ReplicationReport {
            read: entries.len(),
            ..Default::default()
        };

        for entry in entries {
            let Some(counter) = entry.counter_value() else {
                warn!("Skipping replication entry {} without a valid counter", entry.id);
                report.skipped += 1;
                if let Err(e) = self.log.ack(&entry.id).await {
                    warn!("Failed to ack skipped entry {}: {}", entry.id, e);
                }
                continue;
            };

            if let Err(e) = self.durable.upsert(counter).await {
                error!(
                    "Failed to replicate counter {} (entry {}): {}",
                    counter, entry.id, e
                );
                report.failed += 1;
                break;
            }

            report.replicated += 1;
            report.last_counter = Some(counter);

            if let Err(e) = self.log.ack(&entry.id).await {
                warn!("Failed to ack replication entry {}: {}", entry.id, e);
                report.ack_failed += 1;
            }
        }

        if !report.is_noop() {
            metrics::counter!("short_code_counter_replicated_total")
                .increment(report.replicated as u64);
            debug!("Replication pass: {:?}", report);
        }

        Ok(report)
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }
}
