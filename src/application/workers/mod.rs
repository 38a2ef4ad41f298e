//! Long-lived background tasks.
//!
//! Each worker owns a `tokio::time::interval` and stops when the shared
//! [`tokio_util::sync::CancellationToken`] is cancelled.

pub mod expiry_sweeper;
pub mod replication_worker;

pub use expiry_sweeper::ExpirySweeper;
pub use replication_worker::ReplicationWorker;
