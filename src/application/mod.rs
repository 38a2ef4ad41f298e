//! Application layer: services and background workers.
//!
//! Services consume the domain traits and expose the operations used by the
//! HTTP handlers and the admin CLI.
//!
//! # Services
//!
//! - [`services::DistributedCounter`] - Two-tier short-code counter
//! - [`services::ShortCodeGenerator`] - Counter to base62 code
//! - [`services::UrlService`] - Create, resolve, update and expire mappings
//!
//! # Workers
//!
//! - [`workers::ReplicationWorker`] - Drains the replication log into the durable snapshot
//! - [`workers::ExpirySweeper`] - Deletes expired mappings

pub mod services;
pub mod workers;
