//! Counter entities: the durable snapshot and replication log records.

use chrono::{DateTime, Utc};

/// Durable copy of the short-code counter.
///
/// Used only for cold-start recovery; the fast tier is authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterSnapshot {
    pub counter: i64,
    pub updated_at: DateTime<Utc>,
}

/// One counter increment queued for asynchronous durable sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationRecord {
    pub counter: i64,
    /// Unix seconds at the time of the increment.
    pub timestamp: i64,
}

impl ReplicationRecord {
    pub fn new(counter: i64) -> Self {
        Self {
            counter,
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Raw `counter` field as read back from the log.
///
/// Log transports may hand the value back either as an integer or as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterField {
    Int(i64),
    Text(String),
}

impl CounterField {
    /// Parses the field into a counter value.
    ///
    /// Returns `None` for text that is not a base-10 integer.
    pub fn parse(&self) -> Option<i64> {
        match self {
            CounterField::Int(v) => Some(*v),
            CounterField::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// A delivered, not yet acknowledged replication log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Transport-assigned entry id used for acknowledgement.
    pub id: String,
    /// `None` if the entry carried no `counter` field.
    pub counter: Option<CounterField>,
}

impl LogEntry {
    pub fn counter_value(&self) -> Option<i64> {
        self.counter.as_ref().and_then(CounterField::parse)
    }
}

/// Outcome of one replication pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicationReport {
    /// Entries read from the log.
    pub read: usize,
    /// Entries upserted into the durable store.
    pub replicated: usize,
    /// Replicated entries whose acknowledgement failed.
    pub ack_failed: usize,
    /// Entries without a parseable counter.
    pub skipped: usize,
    /// Entries whose upsert failed; left pending for redelivery.
    pub failed: usize,
    /// Last counter value written to the durable store in this pass.
    pub last_counter: Option<i64>,
}

impl ReplicationReport {
    pub fn is_noop(&self) -> bool {
        self.read == 0
    }
}
