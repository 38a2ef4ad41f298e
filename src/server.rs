//! HTTP server initialization and runtime setup.
//!
//! Handles store connections, counter bootstrap, worker spawning, and the
//! Axum server lifecycle including graceful shutdown.

use crate::api::middleware::rate_limit;
use crate::application::services::{DistributedCounter, ShortCodeGenerator, UrlService};
use crate::application::workers::{ExpirySweeper, ReplicationWorker};
use crate::config::Config;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{PgCounterRepository, PgUrlRepository};
use crate::infrastructure::redis::{self as fast_tier, RedisCounterStore, RedisReplicationLog};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_util::sync::CancellationToken;

/// Attempts made to bootstrap the counter before startup fails.
const COUNTER_INIT_ATTEMPTS: usize = 6;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Redis connection, replication consumer group and counter bootstrap
/// - Replication worker and expiry sweeper
/// - Axum HTTP server
///
/// On Ctrl-C / SIGTERM the workers are cancelled, in-flight requests drain,
/// and the worker tasks are awaited before returning.
///
/// # Errors
///
/// Returns an error if:
/// - A store connection or migration fails
/// - The counter cannot be initialized
/// - Server bind fails
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations applied");

    let redis = fast_tier::connect(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;

    let pool = Arc::new(pool);
    let durable_timeout = config.durable_timeout();

    let replication_log = Arc::new(RedisReplicationLog::new(
        redis.clone(),
        &config.replication_stream,
        &config.replication_group,
        &config.replication_consumer,
    ));
    replication_log.ensure_group().await?;

    let counter = Arc::new(
        DistributedCounter::new(
            Arc::new(RedisCounterStore::new(redis.clone())),
            replication_log,
            Arc::new(PgCounterRepository::new(pool.clone()).with_timeout(durable_timeout)),
        )
        .with_key(&config.counter_key),
    );

    bootstrap_counter(&counter).await?;

    let cache: Arc<dyn CacheService> = if config.cache_enabled {
        tracing::info!("Cache enabled (Redis, default TTL {}s)", config.cache_ttl_seconds);
        Arc::new(RedisCache::new(redis, config.cache_ttl()))
    } else {
        tracing::info!("Cache disabled");
        Arc::new(NullCache::new())
    };

    let url_service = Arc::new(UrlService::new(
        Arc::new(PgUrlRepository::new(pool.clone()).with_timeout(durable_timeout)),
        cache.clone(),
        ShortCodeGenerator::new(counter.clone()),
    ));

    let shutdown = CancellationToken::new();

    let replication = ReplicationWorker::new(counter.clone())
        .with_interval(config.replication_interval())
        .with_batch_size(config.replication_batch_size)
        .spawn(shutdown.clone());

    let sweeper = ExpirySweeper::new(url_service.clone())
        .with_interval(config.expiry_sweep_interval())
        .spawn(shutdown.clone());

    let state = AppState {
        url_service,
        counter,
        cache,
    };

    let limiter = rate_limit::layer(
        config.rate_limit_per_second,
        config.rate_limit_burst,
        config.behind_proxy,
    )?;
    let app = app_router(state, Some(limiter));

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    let token = shutdown.clone();
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        token.cancel();
    })
    .await?;

    shutdown.cancel();
    let (replication, sweeper) = tokio::join!(replication, sweeper);
    log_worker_exit("replication worker", replication);
    log_worker_exit("expiry sweeper", sweeper);
    pool.close().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// Bootstraps the counter, retrying with exponential backoff.
///
/// A live fast-tier value is left alone so that starting another instance
/// never rewinds the shared counter.
async fn bootstrap_counter(counter: &DistributedCounter) -> Result<()> {
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(100)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(COUNTER_INIT_ATTEMPTS - 1);

    Retry::spawn(strategy, || async {
        counter.bootstrap().await.inspect_err(|e| {
            tracing::warn!("Counter bootstrap failed, retrying: {}", e);
        })
    })
    .await
    .map(|_| ())
    .context("Failed to initialize short-code counter")
}

/// Reports a worker task that panicked or was aborted.
///
/// Returns whether the worker exited cleanly.
fn log_worker_exit(name: &str, result: Result<(), JoinError>) -> bool {
    match result {
        Ok(()) => {
            tracing::info!("{} stopped", name);
            true
        }
        Err(e) if e.is_panic() => {
            tracing::error!("{} panicked: {}", name, e);
            false
        }
        Err(e) => {
            tracing::error!("{} did not shut down cleanly: {}", name, e);
            false
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
