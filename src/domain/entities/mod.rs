//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures; persistence and transport concerns
//! live in the infrastructure layer.
//!
//! # Entity Types
//!
//! - [`UrlMapping`] - A short code bound to an original URL
//! - [`CounterSnapshot`] - Durable copy of the short-code counter
//! - [`ReplicationRecord`] / [`LogEntry`] - Counter replication log traffic
//!
//! Creation and update inputs use separate structs (`NewUrlMapping`,
//! `UrlMappingPatch`).

pub mod counter;
pub mod url_mapping;

pub use counter::{CounterField, CounterSnapshot, LogEntry, ReplicationRecord, ReplicationReport};
pub use url_mapping::{NewUrlMapping, UrlMapping, UrlMappingPatch};
