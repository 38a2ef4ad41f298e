//! Domain layer containing business entities and storage contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Traits define contracts implemented by the infrastructure layer
//! - Business logic lives in services (see [`crate::application::services`])
//!
//! # Counter Flow
//!
//! 1. [`repositories::CounterStore::incr`] hands out the next value
//! 2. A [`entities::ReplicationRecord`] is appended to the [`repositories::ReplicationLog`]
//! 3. The replication worker drains the log into the [`repositories::CounterRepository`]

pub mod entities;
pub mod repositories;
