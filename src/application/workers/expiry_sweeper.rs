//! Periodic removal of expired URL mappings.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::services::UrlService;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Deletes mappings whose `expires_at` has passed.
///
/// Reads already treat expired mappings as absent; the sweeper only
/// reclaims rows that are never read again.
pub struct ExpirySweeper {
    urls: Arc<UrlService>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(urls: Arc<UrlService>) -> Self {
        Self {
            urls,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs one sweep and returns the number of deleted mappings.
    pub async fn sweep(&self) -> u64 {
        match self.urls.purge_expired().await {
            Ok(0) => 0,
            Ok(n) => {
                debug!("Expiry sweep removed {} mappings", n);
                n
            }
            Err(e) => {
                warn!("Expiry sweep failed: {}", e);
                0
            }
        }
    }

    pub async fn run(self, token: CancellationToken) {
        info!("Expiry sweeper started (interval {:?})", self.interval);

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    self.sweep().await;
                }
            }
        }

        info!("Expiry sweeper stopped");
    }

    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }
}
