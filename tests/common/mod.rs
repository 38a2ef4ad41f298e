#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use seq_shortener::application::services::{DistributedCounter, ShortCodeGenerator, UrlService};
use seq_shortener::domain::entities::{
    CounterField, CounterSnapshot, LogEntry, NewUrlMapping, ReplicationRecord, UrlMapping,
    UrlMappingPatch,
};
use seq_shortener::domain::repositories::{
    CounterRepository, CounterStore, ReplicationLog, UrlRepository,
};
use seq_shortener::error::AppError;
use seq_shortener::infrastructure::cache::{CacheResult, CacheService};
use seq_shortener::routes::app_router;
use seq_shortener::state::AppState;

use axum::ServiceExt;
use axum::extract::Request;
use axum_test::TestServer;

/// URL mappings held in memory with the same uniqueness rules as the table.
#[derive(Default)]
pub struct InMemoryUrlRepository {
    rows: Mutex<Vec<UrlMapping>>,
    next_id: AtomicU64,
}

impl InMemoryUrlRepository {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get(&self, short_code: &str) -> Option<UrlMapping> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.short_code == short_code)
            .cloned()
    }
}

#[async_trait]
impl UrlRepository for InMemoryUrlRepository {
    async fn create(&self, new_mapping: NewUrlMapping) -> Result<UrlMapping, AppError> {
        let mut rows = self.rows.lock().unwrap();

        let taken = rows.iter().any(|m| {
            m.short_code == new_mapping.short_code
                || (new_mapping.alias.is_some() && m.alias == new_mapping.alias)
        });
        if taken {
            return Err(AppError::conflict(
                "Short code or alias already exists",
                json!({ "short_code": new_mapping.short_code }),
            ));
        }

        let now = Utc::now();
        let mapping = UrlMapping {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1,
            short_code: new_mapping.short_code,
            original_url: new_mapping.original_url,
            alias: new_mapping.alias,
            expires_at: new_mapping.expires_at,
            created_at: now,
            updated_at: now,
            user_id: new_mapping.user_id,
        };
        rows.push(mapping.clone());

        Ok(mapping)
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlMapping>, AppError> {
        Ok(self.get(short_code))
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<UrlMapping>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.alias.as_deref() == Some(alias))
            .cloned())
    }

    async fn exists(&self, short_code: &str) -> Result<bool, AppError> {
        Ok(self.get(short_code).is_some())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<UrlMapping>, AppError> {
        let mut urls: Vec<UrlMapping> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        urls.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(urls)
    }

    async fn update(
        &self,
        short_code: &str,
        patch: UrlMappingPatch,
    ) -> Result<Option<UrlMapping>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(mapping) = rows.iter_mut().find(|m| m.short_code == short_code) else {
            return Ok(None);
        };

        if let Some(url) = patch.original_url {
            mapping.original_url = url;
        }
        if let Some(expires_at) = patch.expires_at {
            mapping.expires_at = expires_at;
        }
        mapping.updated_at = Utc::now();

        Ok(Some(mapping.clone()))
    }

    async fn delete(&self, short_code: &str) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|m| m.short_code != short_code);
        Ok(rows.len() != before)
    }

    async fn delete_expired(&self) -> Result<u64, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|m| !m.is_expired());
        Ok((before - rows.len()) as u64)
    }
}

/// Single-row durable counter snapshot.
#[derive(Default)]
pub struct InMemoryCounterRepository {
    snapshot: Mutex<Option<CounterSnapshot>>,
}

impl InMemoryCounterRepository {
    pub fn with_counter(counter: i64) -> Self {
        Self {
            snapshot: Mutex::new(Some(CounterSnapshot {
                counter,
                updated_at: Utc::now(),
            })),
        }
    }

    pub fn counter(&self) -> Option<i64> {
        self.snapshot.lock().unwrap().as_ref().map(|s| s.counter)
    }
}

#[async_trait]
impl CounterRepository for InMemoryCounterRepository {
    async fn find(&self) -> Result<Option<CounterSnapshot>, AppError> {
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn create_if_absent(&self, initial: i64) -> Result<CounterSnapshot, AppError> {
        let mut snapshot = self.snapshot.lock().unwrap();
        Ok(snapshot
            .get_or_insert_with(|| CounterSnapshot {
                counter: initial,
                updated_at: Utc::now(),
            })
            .clone())
    }

    async fn upsert(&self, counter: i64) -> Result<(), AppError> {
        *self.snapshot.lock().unwrap() = Some(CounterSnapshot {
            counter,
            updated_at: Utc::now(),
        });
        Ok(())
    }
}

/// Fast-tier counter keyed like Redis, with a switch to simulate an outage.
#[derive(Default)]
pub struct InMemoryCounterStore {
    values: Mutex<HashMap<String, i64>>,
    down: AtomicBool,
}

impl InMemoryCounterStore {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(AppError::internal("Redis error", json!({ "reason": "down" })));
        }
        Ok(())
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn incr(&self, key: &str) -> Result<i64, AppError> {
        self.check()?;
        let mut values = self.values.lock().unwrap();
        let value = values.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, AppError> {
        self.check()?;
        Ok(self.values.lock().unwrap().get(key).copied())
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), AppError> {
        self.check()?;
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, AppError> {
        self.check()?;
        let mut values = self.values.lock().unwrap();
        if values.contains_key(key) {
            return Ok(false);
        }
        values.insert(key.to_string(), value);
        Ok(true)
    }

    async fn health_check(&self) -> bool {
        !self.down.load(Ordering::SeqCst)
    }
}

/// Stream with a single consumer: entries stay pending until acked.
#[derive(Default)]
pub struct InMemoryReplicationLog {
    entries: Mutex<BTreeMap<u64, Option<CounterField>>>,
    seq: AtomicU64,
}

impl InMemoryReplicationLog {
    pub fn push_raw(&self, counter: Option<CounterField>) -> String {
        let id = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.entries.lock().unwrap().insert(id, counter);
        format!("{id}-0")
    }

    pub fn pending(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl ReplicationLog for InMemoryReplicationLog {
    async fn append(&self, record: &ReplicationRecord) -> Result<(), AppError> {
        self.push_raw(Some(CounterField::Int(record.counter)));
        Ok(())
    }

    async fn read_pending(&self, max: usize) -> Result<Vec<LogEntry>, AppError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .take(max)
            .map(|(id, counter)| LogEntry {
                id: format!("{id}-0"),
                counter: counter.clone(),
            })
            .collect())
    }

    async fn ack(&self, id: &str) -> Result<(), AppError> {
        let seq = id
            .split('-')
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| AppError::internal("Bad entry id", json!({ "id": id })))?;

        match self.entries.lock().unwrap().remove(&seq) {
            Some(_) => Ok(()),
            None => Err(AppError::internal("Entry not pending", json!({ "id": id }))),
        }
    }
}

/// Cache that honours per-entry TTLs.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl InMemoryCache {
    pub fn contains(&self, short_code: &str) -> bool {
        self.entries.lock().unwrap().contains_key(short_code)
    }

    pub fn insert(&self, short_code: &str, original_url: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(short_code.to_string(), (original_url.to_string(), None));
    }
}

#[async_trait]
impl CacheService for InMemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock().unwrap();
        let expired = entries
            .get(short_code)
            .and_then(|(_, deadline)| *deadline)
            .is_some_and(|deadline| Instant::now() >= deadline);
        if expired {
            entries.remove(short_code);
            return Ok(None);
        }
        Ok(entries.get(short_code).map(|(url, _)| url.clone()))
    }

    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        self.entries.lock().unwrap().insert(
            short_code.to_string(),
            (original_url.to_string(), ttl.map(|t| Instant::now() + t)),
        );
        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        self.entries.lock().unwrap().remove(short_code);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Application state wired to in-memory stores, plus handles on each store.
pub struct TestContext {
    pub state: AppState,
    pub urls: Arc<InMemoryUrlRepository>,
    pub durable: Arc<InMemoryCounterRepository>,
    pub store: Arc<InMemoryCounterStore>,
    pub log: Arc<InMemoryReplicationLog>,
    pub cache: Arc<InMemoryCache>,
}

impl TestContext {
    pub fn server(&self) -> TestServer {
        let app = app_router(self.state.clone(), None);
        TestServer::new(ServiceExt::<Request>::into_make_service(app)).unwrap()
    }
}

pub fn create_test_state() -> TestContext {
    create_test_state_with(InMemoryCounterRepository::default())
}

pub fn create_test_state_with(durable: InMemoryCounterRepository) -> TestContext {
    create_test_state_over(
        Arc::new(durable),
        Arc::new(InMemoryCounterStore::default()),
        Arc::new(InMemoryReplicationLog::default()),
    )
}

/// Builds another instance sharing the given counter tiers.
pub fn create_test_state_over(
    durable: Arc<InMemoryCounterRepository>,
    store: Arc<InMemoryCounterStore>,
    log: Arc<InMemoryReplicationLog>,
) -> TestContext {
    let urls = Arc::new(InMemoryUrlRepository::default());
    let cache = Arc::new(InMemoryCache::default());

    let counter = Arc::new(DistributedCounter::new(
        store.clone(),
        log.clone(),
        durable.clone(),
    ));

    let url_service = Arc::new(UrlService::new(
        urls.clone(),
        cache.clone(),
        ShortCodeGenerator::new(counter.clone()),
    ));

    let state = AppState {
        url_service,
        counter,
        cache: cache.clone(),
    };

    TestContext {
        state,
        urls,
        durable,
        store,
        log,
        cache,
    }
}
