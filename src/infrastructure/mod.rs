//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`cache`] - Redirect cache (Redis and no-op implementations)
//! - [`persistence`] - PostgreSQL repositories (durable tier)
//! - [`redis`] - Atomic counter and replication stream (fast tier)

pub mod cache;
pub mod persistence;
pub mod redis;
