//! Redis stream implementation of the replication log.

use async_trait::async_trait;
use redis::streams::{StreamId, StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Pipeline, RedisError, Value, aio::ConnectionManager};
use serde_json::json;
use tracing::{debug, info};

use crate::domain::entities::{CounterField, LogEntry, ReplicationRecord};
use crate::domain::repositories::ReplicationLog;
use crate::error::AppError;

/// Start id for this consumer's pending entries list.
const PENDING_ID: &str = "0";

/// Special id requesting entries never delivered to the group.
const NEW_ENTRIES_ID: &str = ">";

/// Replication log stored in a Redis stream.
///
/// Entries are appended with `XADD` and consumed with `XREADGROUP` under a
/// single consumer group. Acknowledging an entry runs `XACK` and `XDEL` in
/// one transaction, so the stream only holds entries not yet replicated.
pub struct RedisReplicationLog {
    client: ConnectionManager,
    stream: String,
    group: String,
    consumer: String,
}

impl RedisReplicationLog {
    pub fn new(
        client: ConnectionManager,
        stream: impl Into<String>,
        group: impl Into<String>,
        consumer: impl Into<String>,
    ) -> Self {
        Self {
            client,
            stream: stream.into(),
            group: group.into(),
            consumer: consumer.into(),
        }
    }

    /// Creates the stream and consumer group if they do not exist yet.
    ///
    /// The group starts at id `0`, so entries appended before the first
    /// startup are replicated as well.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on any Redis error other than
    /// `BUSYGROUP` (group already exists).
    pub async fn ensure_group(&self) -> Result<(), AppError> {
        let mut conn = self.client.clone();

        match conn
            .xgroup_create_mkstream::<_, _, _, ()>(&self.stream, &self.group, PENDING_ID)
            .await
        {
            Ok(()) => {
                info!(
                    "Created consumer group '{}' on stream '{}'",
                    self.group, self.stream
                );
                Ok(())
            }
            Err(e) if is_busy_group(&e) => {
                debug!("Consumer group '{}' already exists", self.group);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_from(&self, id: &str, max: usize) -> Result<Vec<LogEntry>, AppError> {
        let mut conn = self.client.clone();
        let options = StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .count(max);

        let reply: Option<StreamReadReply> = conn
            .xread_options(&[&self.stream], &[id], &options)
            .await?;

        Ok(reply
            .map(|r| {
                r.keys
                    .into_iter()
                    .flat_map(|key| key.ids)
                    .map(to_log_entry)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl ReplicationLog for RedisReplicationLog {
    async fn append(&self, record: &ReplicationRecord) -> Result<(), AppError> {
        let mut conn = self.client.clone();
        let id: String = conn
            .xadd(
                &self.stream,
                "*",
                &[
                    ("counter", record.counter),
                    ("timestamp", record.timestamp),
                ],
            )
            .await?;

        debug!("XADD {} {} counter={}", self.stream, id, record.counter);
        Ok(())
    }

    async fn read_pending(&self, max: usize) -> Result<Vec<LogEntry>, AppError> {
        if max == 0 {
            return Ok(Vec::new());
        }

        let pending = self.read_from(PENDING_ID, max).await?;
        if !pending.is_empty() {
            debug!("Redelivering {} pending replication entries", pending.len());
            return Ok(pending);
        }

        self.read_from(NEW_ENTRIES_ID, max).await
    }

    async fn ack(&self, id: &str) -> Result<(), AppError> {
        let mut conn = self.client.clone();
        let (acked, deleted): (i64, i64) = ack_pipeline(&self.stream, &self.group, id)
            .query_async(&mut conn)
            .await?;
        debug!("XACK/XDEL {} {} -> {}/{}", self.stream, id, acked, deleted);

        if acked == 0 {
            return Err(AppError::internal(
                "Replication entry was not pending",
                json!({ "id": id }),
            ));
        }

        Ok(())
    }
}

fn ack_pipeline(stream: &str, group: &str, id: &str) -> Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic().xack(stream, group, &[id]).xdel(stream, &[id]);
    pipe
}

fn is_busy_group(e: &RedisError) -> bool {
    e.code() == Some("BUSYGROUP")
}

fn to_log_entry(entry: StreamId) -> LogEntry {
    let counter = entry.map.get("counter").and_then(counter_field);
    LogEntry {
        id: entry.id,
        counter,
    }
}

fn counter_field(value: &Value) -> Option<CounterField> {
    match value {
        Value::Int(v) => Some(CounterField::Int(*v)),
        Value::BulkString(bytes) => Some(CounterField::Text(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
        Value::SimpleString(s) => Some(CounterField::Text(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn stream_id(id: &str, fields: Vec<(&str, Value)>) -> StreamId {
        let map: HashMap<String, Value> = fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        StreamId {
            id: id.to_string(),
            map,
            ..Default::default()
        }
    }

    #[test]
    fn test_entry_with_bulk_string_counter() {
        let entry = to_log_entry(stream_id(
            "1-0",
            vec![("counter", Value::BulkString(b"42".to_vec()))],
        ));

        assert_eq!(entry.id, "1-0");
        assert_eq!(entry.counter_value(), Some(42));
    }

    #[test]
    fn test_entry_with_int_counter() {
        let entry = to_log_entry(stream_id("2-0", vec![("counter", Value::Int(7))]));
        assert_eq!(entry.counter_value(), Some(7));
    }

    #[test]
    fn test_entry_without_counter_field() {
        let entry = to_log_entry(stream_id("3-0", vec![("timestamp", Value::Int(1))]));
        assert_eq!(entry.counter, None);
    }

    #[test]
    fn test_entry_with_garbage_counter() {
        let entry = to_log_entry(stream_id(
            "4-0",
            vec![("counter", Value::BulkString(b"abc".to_vec()))],
        ));

        assert!(entry.counter.is_some());
        assert_eq!(entry.counter_value(), None);
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_ack_deletes_entry_in_same_transaction() {
        let packed = ack_pipeline("counter_replication", "replicators", "5-0").get_packed_pipeline();

        assert!(contains(&packed, b"MULTI"));
        assert!(contains(&packed, b"XACK"));
        assert!(contains(&packed, b"XDEL"));
        assert!(contains(&packed, b"EXEC"));

        let xack = packed.windows(4).position(|w| w == b"XACK").unwrap();
        let xdel = packed.windows(4).position(|w| w == b"XDEL").unwrap();
        assert!(xack < xdel, "entry is acknowledged before it is deleted");
        assert_eq!(
            packed.windows(3).filter(|w| *w == b"5-0").count(),
            2,
            "both commands target the entry"
        );
    }

    #[test]
    fn test_nil_counter_is_missing() {
        assert_eq!(counter_field(&Value::Nil), None);
    }
}
