//! CLI administration tool for seq-shortener.
//!
//! Inspects and repairs the short-code counter, converts between counter
//! values and short codes, and runs database diagnostics without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Show the fast-tier and durable counter values
//! cargo run --bin admin -- counter show
//!
//! # Seed the fast tier from the durable snapshot
//! cargo run --bin admin -- counter init
//!
//! # Drain the replication log once
//! cargo run --bin admin -- counter replicate
//!
//! # Convert between short codes and counter values
//! cargo run --bin admin -- code decode 3D7
//! cargo run --bin admin -- code encode 12345
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server: `DATABASE_URL` (or `DB_*`) and `REDIS_URL`
//! (or `REDIS_HOST`). The `code` commands need neither.

use seq_shortener::application::services::DistributedCounter;
use seq_shortener::config::{self, Config};
use seq_shortener::domain::repositories::CounterStore;
use seq_shortener::infrastructure::persistence::PgCounterRepository;
use seq_shortener::infrastructure::redis::{self as fast_tier, RedisCounterStore, RedisReplicationLog};
use seq_shortener::utils::base62;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing seq-shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and maintain the short-code counter
    Counter {
        #[command(subcommand)]
        action: CounterAction,
    },

    /// Convert between short codes and counter values
    Code {
        #[command(subcommand)]
        action: CodeAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum CounterAction {
    /// Show the fast-tier value and the durable snapshot
    Show,

    /// Seed the fast tier from the durable snapshot
    Init {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Run a single replication pass
    Replicate {
        /// Maximum entries to read
        #[arg(short, long)]
        batch_size: Option<usize>,
    },
}

#[derive(Subcommand)]
enum CodeAction {
    /// Decode a short code into its counter value
    Decode { code: String },

    /// Encode a counter value as a short code
    Encode { value: u64 },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Code { action } => handle_code_action(action)?,
        Commands::Counter { action } => {
            let config = config::load_from_env()?;
            let pool = connect_database(&config).await?;
            handle_counter_action(action, &config, pool).await?;
        }
        Commands::Stats => {
            let config = config::load_from_env()?;
            handle_stats(&connect_database(&config).await?).await?;
        }
        Commands::Db { action } => {
            let config = config::load_from_env()?;
            handle_db_action(action, &connect_database(&config).await?).await?;
        }
    }

    Ok(())
}

async fn connect_database(config: &Config) -> Result<PgPool> {
    PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Dispatches counter commands against live Redis and PostgreSQL.
async fn handle_counter_action(action: CounterAction, config: &Config, pool: PgPool) -> Result<()> {
    let redis = fast_tier::connect(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;

    let store = Arc::new(RedisCounterStore::new(redis.clone()));
    let log = Arc::new(RedisReplicationLog::new(
        redis,
        &config.replication_stream,
        &config.replication_group,
        &config.replication_consumer,
    ));
    log.ensure_group()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create consumer group: {}", e))?;

    let counter = DistributedCounter::new(
        store.clone(),
        log,
        Arc::new(PgCounterRepository::new(Arc::new(pool)).with_timeout(config.durable_timeout())),
    )
    .with_key(&config.counter_key);

    match action {
        CounterAction::Show => show_counter(&counter, store.as_ref()).await?,
        CounterAction::Init { yes } => init_counter(&counter, yes).await?,
        CounterAction::Replicate { batch_size } => {
            replicate(&counter, batch_size.unwrap_or(config.replication_batch_size)).await?
        }
    }

    Ok(())
}

/// Prints both tiers side by side.
///
/// The difference between them is the replication lag: increments that
/// have been issued but not yet folded into the snapshot.
async fn show_counter(counter: &DistributedCounter, store: &RedisCounterStore) -> Result<()> {
    println!("{}", "🔢 Short-code Counter".bright_blue().bold());
    println!();

    let fast = store
        .get(counter.key())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read fast tier: {}", e))?;
    let durable = counter
        .durable_snapshot()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read durable snapshot: {}", e))?;

    println!("  Key:        {}", counter.key().cyan());
    match fast {
        Some(v) => println!("  Fast tier:  {}", v.to_string().bright_green().bold()),
        None => println!("  Fast tier:  {}", "not set".yellow()),
    }
    match &durable {
        Some(s) => println!(
            "  Durable:    {} {}",
            s.counter.to_string().bright_green().bold(),
            format!("(updated {})", s.updated_at.format("%Y-%m-%d %H:%M:%S")).bright_black()
        ),
        None => println!("  Durable:    {}", "no snapshot".yellow()),
    }

    if let (Some(fast), Some(snapshot)) = (fast, durable) {
        let lag = fast - snapshot.counter;
        let lag = if lag < 0 {
            lag.to_string().red()
        } else {
            lag.to_string().bright_white()
        };
        println!("  Lag:        {}", lag);
    }
    println!();

    Ok(())
}

async fn init_counter(counter: &DistributedCounter, skip_confirm: bool) -> Result<()> {
    println!("{}", "🔧 Initialize Counter".bright_blue().bold());
    println!();
    println!(
        "  The fast tier ({}) will be overwritten with the durable snapshot.",
        counter.key().cyan()
    );
    println!(
        "{}",
        "  ⚠️  Codes issued since the last replication may be handed out again."
            .yellow()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Initialize the counter?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    counter
        .initialize_counter()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize counter: {}", e))?;

    let current = counter
        .get_current_counter()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read counter: {}", e))?;

    println!();
    println!(
        "{} {}",
        "✅ Counter initialized at".green().bold(),
        current.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn replicate(counter: &DistributedCounter, batch_size: usize) -> Result<()> {
    println!("{}", "🔁 Replication Pass".bright_blue().bold());
    println!();

    let report = counter
        .replicate_pending(batch_size)
        .await
        .map_err(|e| anyhow::anyhow!("Replication failed: {}", e))?;

    if report.is_noop() {
        println!("{}", "  Nothing pending".yellow());
        println!();
        return Ok(());
    }

    println!("  Read:        {}", report.read.to_string().bright_white());
    println!(
        "  Replicated:  {}",
        report.replicated.to_string().bright_green().bold()
    );
    if report.skipped > 0 {
        println!("  Skipped:     {}", report.skipped.to_string().yellow());
    }
    if report.failed > 0 {
        println!("  Failed:      {}", report.failed.to_string().red());
    }
    if report.ack_failed > 0 {
        println!("  Ack failed:  {}", report.ack_failed.to_string().red());
    }
    if let Some(last) = report.last_counter {
        println!("  Durable now: {}", last.to_string().bright_green().bold());
    }
    println!();

    Ok(())
}

fn handle_code_action(action: CodeAction) -> Result<()> {
    match action {
        CodeAction::Decode { code } => {
            let value = base62::decode(&code).with_context(|| format!("Invalid short code {code:?}"))?;
            println!("  {} → {}", code.cyan(), value.to_string().bright_green().bold());
        }
        CodeAction::Encode { value } => {
            println!(
                "  {} → {}",
                value.to_string().bright_white(),
                base62::encode(value).cyan().bold()
            );
        }
    }

    Ok(())
}

/// Displays mapping statistics.
///
/// Shows:
/// - Total number of mappings
/// - Mappings with a custom alias
/// - Expired mappings awaiting the sweeper
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM url_mappings")
        .fetch_one(pool)
        .await?;

    let aliased: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM url_mappings WHERE alias IS NOT NULL")
            .fetch_one(pool)
            .await?;

    let expired: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM url_mappings WHERE expires_at IS NOT NULL AND expires_at <= NOW()",
    )
    .fetch_one(pool)
    .await?;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM url_mappings")
        .fetch_one(pool)
        .await?;

    println!("  Mappings:  {}", total.to_string().bright_green().bold());
    println!("  Aliased:   {}", aliased.to_string().bright_green().bold());
    println!("  Expired:   {}", expired.to_string().yellow().bold());
    println!("  Users:     {}", users.to_string().bright_green().bold());
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
