use std::env;
use std::time::Duration;

use anyhow::Context as _;
use playerhub_database::cache::DEFAULT_LEADERBOARD_TTL;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_REDIS_KEY_PREFIX: &str = "playerhub:prod";

/// Startup settings read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub auto_run_migrations: bool,
    pub redis_enabled: bool,
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub leaderboard_ttl: Duration,
    pub debug_logging: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let max_connections = u32::try_from(env_u64(
            "DATABASE_MAX_CONNECTIONS",
            u64::from(DEFAULT_MAX_CONNECTIONS),
        ))
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
        .max(1);

        Ok(Self {
            database_url,
            max_connections,
            auto_run_migrations: env_bool("AUTO_RUN_MIGRATIONS", true),
            redis_enabled: env_bool("REDIS_ENABLED", false),
            redis_url: env::var("REDIS_URL")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            redis_key_prefix: env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_REDIS_KEY_PREFIX.to_string()),
            leaderboard_ttl: Duration::from_secs(env_u64(
                "LEADERBOARD_CACHE_TTL_SECONDS",
                DEFAULT_LEADERBOARD_TTL.as_secs(),
            )),
            debug_logging: debug_logging_enabled(),
        })
    }
}

/// Read before the subscriber is installed, so it cannot depend on `Config`.
pub fn debug_logging_enabled() -> bool {
    env_bool("PLAYERHUB_LOG_DEBUG", false)
}

pub fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => parse_bool(&value),
        Err(_) => default,
    }
}

pub fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::parse_bool;

    #[test]
    fn accepts_common_truthy_spellings() {
        for value in ["1", "true", "TRUE", " yes ", "On"] {
            assert!(parse_bool(value), "{value:?} should be true");
        }
    }

    #[test]
    fn everything_else_is_false() {
        for value in ["0", "false", "", "enabled", "no"] {
            assert!(!parse_bool(value), "{value:?} should be false");
        }
    }
}
