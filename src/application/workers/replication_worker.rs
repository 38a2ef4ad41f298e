//! Background task draining the counter replication log.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::application::services::DistributedCounter;
use crate::domain::entities::ReplicationReport;

pub const DEFAULT_REPLICATION_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REPLICATION_BATCH_SIZE: usize = 100;

/// Periodically copies counter increments into the durable snapshot.
///
/// The worker never writes to the fast-tier counter.
pub struct ReplicationWorker {
    counter: Arc<DistributedCounter>,
    interval: Duration,
    batch_size: usize,
}

impl ReplicationWorker {
    pub fn new(counter: Arc<DistributedCounter>) -> Self {
        Self {
            counter,
            interval: DEFAULT_REPLICATION_INTERVAL,
            batch_size: DEFAULT_REPLICATION_BATCH_SIZE,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Runs a single replication pass.
    ///
    /// Errors are logged and reported as an empty pass; the next tick
    /// retries whatever is still pending.
    pub async fn tick(&self) -> ReplicationReport {
        match self.counter.replicate_pending(self.batch_size).await {
            Ok(report) => {
                if report.failed > 0 || report.ack_failed > 0 {
                    error!(
                        "Replication pass incomplete: {} failed, {} unacknowledged",
                        report.failed, report.ack_failed
                    );
                } else if !report.is_noop() {
                    debug!(
                        "Replicated {} entries (last counter {:?})",
                        report.replicated, report.last_counter
                    );
                }
                report
            }
            Err(e) => {
                error!("Failed to read replication log: {}", e);
                ReplicationReport::default()
            }
        }
    }

    /// Ticks until `token` is cancelled.
    ///
    /// Cancellation is observed between ticks; a pass already in progress
    /// runs to completion.
    pub async fn run(self, token: CancellationToken) {
        info!(
            "Replication worker started (interval {:?}, batch {})",
            self.interval, self.batch_size
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Replication worker stopped");
    }

    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }
}
