mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;
use sqlx::postgres::PgPoolOptions;

use playerhub_database::{CacheService, Database, MIGRATOR};

use crate::cli::{Cli, Commands};
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load the .env file
    dotenvy::dotenv().ok();

    let max_level = if config::debug_logging_enabled() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(move |metadata| {
            if *metadata.level() > max_level {
                return false;
            }

            // statement logging from sqlx drowns out everything else
            !metadata.target().starts_with("sqlx::query")
        }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!(
        max_connections = config.max_connections,
        debug_logging = config.debug_logging,
        "PostgreSQL connection established."
    );

    let mut cache = build_cache(&config);
    cache.configure_leaderboard_ttl(config.leaderboard_ttl);
    info!(
        leaderboard_ttl_seconds = cache.leaderboard_ttl().as_secs(),
        "Leaderboard cache configured."
    );

    if cache.is_redis_enabled() {
        if let Err(err) = cache.ping().await {
            warn!(
                ?err,
                "Redis cache ping failed; cache operations will continue with fallback behavior."
            );
        } else {
            info!("Redis cache health check passed.");
        }
    }

    let db = Database::with_cache(db_pool, cache);

    // `migrate` runs them itself; don't apply twice
    if !matches!(cli.command, Commands::Migrate) {
        if config.auto_run_migrations {
            MIGRATOR.run(db.pool()).await?;
            info!("Database migrations applied.");
        } else {
            info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
        }
    }

    let ctx = commands::Context::new(db);
    commands::run(&ctx, cli.command).await
}

fn build_cache(config: &Config) -> CacheService {
    let prefix = config.redis_key_prefix.clone();

    if !config.redis_enabled {
        info!("Redis cache disabled (set REDIS_ENABLED=true to enable).");
        return CacheService::disabled(prefix);
    }

    match config.redis_url.as_deref() {
        Some(redis_url) => match CacheService::redis(redis_url, prefix.clone()) {
            Ok(cache) => {
                info!(key_prefix = %prefix, "Redis cache enabled.");
                cache
            }
            Err(err) => {
                warn!(?err, key_prefix = %prefix, "Failed to initialize Redis cache; continuing with DB-only mode.");
                CacheService::disabled(prefix)
            }
        },
        None => {
            warn!(key_prefix = %prefix, "REDIS_ENABLED=true but REDIS_URL is missing; continuing with DB-only mode.");
            CacheService::disabled(prefix)
        }
    }
}
