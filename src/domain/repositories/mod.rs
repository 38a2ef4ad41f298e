//! Repository and store trait definitions for the domain layer.
//!
//! These traits abstract every external system the core talks to. Concrete
//! implementations live in `crate::infrastructure`; mocks are generated via
//! `mockall` for unit tests.
//!
//! # Available Traits
//!
//! - [`UrlRepository`] - URL mapping persistence (durable tier)
//! - [`CounterRepository`] - Durable counter snapshot
//! - [`CounterStore`] - Fast-tier atomic counter
//! - [`ReplicationLog`] - Append-only log feeding the durable snapshot

pub mod counter_repository;
pub mod counter_store;
pub mod replication_log;
pub mod url_repository;

pub use counter_repository::CounterRepository;
pub use counter_store::CounterStore;
pub use replication_log::ReplicationLog;
pub use url_repository::UrlRepository;

#[cfg(test)]
pub use counter_repository::MockCounterRepository;
#[cfg(test)]
pub use counter_store::MockCounterStore;
#[cfg(test)]
pub use replication_log::MockReplicationLog;
#[cfg(test)]
pub use url_repository::MockUrlRepository;
