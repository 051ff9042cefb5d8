mod noop_store;
mod redis_store;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use noop_store::NoopCacheStore;
use redis_store::RedisCacheStore;

pub const DEFAULT_LEADERBOARD_TTL: Duration = Duration::from_secs(30);
pub const CATALOG_CACHE_TTL: Duration = Duration::from_secs(300);
/// Rows kept in the cached leaderboard snapshot; smaller limits slice it.
pub const LEADERBOARD_SNAPSHOT_SIZE: u32 = 100;

#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled(NoopCacheStore),
    Redis(RedisCacheStore),
}

#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
    leaderboard_ttl: Duration,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled(NoopCacheStore),
            leaderboard_ttl: DEFAULT_LEADERBOARD_TTL,
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Redis(RedisCacheStore::from_url(redis_url)?),
            leaderboard_ttl: DEFAULT_LEADERBOARD_TTL,
        })
    }

    pub fn configure_leaderboard_ttl(&mut self, ttl: Duration) {
        self.leaderboard_ttl = ttl.max(Duration::from_secs(1));
    }

    pub fn leaderboard_ttl(&self) -> Duration {
        self.leaderboard_ttl
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.ping().await,
            CacheBackend::Redis(store) => store.ping().await,
        }
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let value = match &self.backend {
            CacheBackend::Disabled(store) => store.get(key).await,
            CacheBackend::Redis(store) => store.get(key).await,
        }?;

        match value {
            Some(bytes) => {
                let parsed = serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize cache value for `{key}`: {e}")
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let ttl_seconds = ttl.as_secs().max(1);
        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize cache value for `{key}`: {e}"))?;

        match &self.backend {
            CacheBackend::Disabled(store) => store.set(key, payload, ttl_seconds).await,
            CacheBackend::Redis(store) => store.set(key, payload, ttl_seconds).await,
        }
    }

    pub async fn del(&self, key: &str) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.del(key).await,
            CacheBackend::Redis(store) => store.del(key).await,
        }
    }

    /// Serve from cache, or load from the database and populate the cache.
    /// Cache failures are logged and never fail the read.
    pub async fn get_or_load_json<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(
                ?e,
                cache_key = key,
                "cache get failed; falling back to database"
            ),
        }

        let loaded = loader().await?;

        if let Err(e) = self.set_json(key, &loaded, ttl).await {
            warn!(
                ?e,
                cache_key = key,
                "cache set failed; returning database value"
            );
        }

        Ok(loaded)
    }
}

pub fn leaderboard_key(cache: &CacheService) -> String {
    cache.key("leaderboard")
}

pub fn genres_key(cache: &CacheService) -> String {
    cache.key("catalog:genres")
}

/// Drop the leaderboard snapshot after any reward. A failed delete only
/// leaves the snapshot stale until its TTL runs out.
pub async fn invalidate_leaderboard(cache: &CacheService) {
    let key = leaderboard_key(cache);
    if let Err(e) = cache.del(&key).await {
        warn!(?e, cache_key = %key, "failed to invalidate leaderboard cache");
    }
}

pub async fn invalidate_catalog(cache: &CacheService) {
    let key = genres_key(cache);
    if let Err(e) = cache.del(&key).await {
        warn!(?e, cache_key = %key, "failed to invalidate catalog cache");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::{CacheService, leaderboard_key};

    #[test]
    fn keys_are_prefixed() {
        let cache = CacheService::disabled("playerhub:test");
        assert_eq!(leaderboard_key(&cache), "playerhub:test:leaderboard");
        assert_eq!(cache.key("x"), "playerhub:test:x");
        assert!(!cache.is_redis_enabled());
    }

    #[test]
    fn leaderboard_ttl_has_a_floor() {
        let mut cache = CacheService::disabled("playerhub:test");
        cache.configure_leaderboard_ttl(Duration::ZERO);
        assert_eq!(cache.leaderboard_ttl(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn disabled_cache_always_loads() {
        let cache = CacheService::disabled("playerhub:test");
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let value: Vec<i64> = cache
                .get_or_load_json("k", Duration::from_secs(5), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
