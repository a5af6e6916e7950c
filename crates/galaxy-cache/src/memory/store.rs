//! In-memory cache implementation using the moka crate.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tracing::debug;

use galaxy_core::config::cache::MemoryCacheConfig;
use galaxy_core::result::AppResult;
use galaxy_core::traits::cache::CacheProvider;

/// A stored value together with the TTL it was written with.
#[derive(Debug, Clone)]
struct TimedValue {
    value: String,
    ttl: Duration,
}

/// Expires each entry after its own TTL, restarting on overwrite.
struct PerEntryTtl;

impl Expiry<String, TimedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &TimedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &TimedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory cache provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    cache: Cache<String, TimedValue>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    ///
    /// The cache is unbounded. Blacklist entries must outlive pressure from
    /// other writes, and their TTL already bounds how long each one stays.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .initial_capacity(config.initial_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        if ttl.is_zero() {
            debug!(key, "Skipping cache write with zero TTL");
            return Ok(());
        }
        self.cache
            .insert(
                key.to_string(),
                TimedValue {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.cache.get(key).await.is_some())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider() -> MemoryCacheProvider {
        MemoryCacheProvider::new(&MemoryCacheConfig {
            initial_capacity: 16,
        })
    }

    #[tokio::test]
    async fn test_set_get() {
        let provider = make_provider();
        provider
            .set("key1", "value1", Duration::from_secs(60))
            .await
            .unwrap();
        let val = provider.get("key1").await.unwrap();
        assert_eq!(val, Some("value1".to_string()));
        assert!(provider.exists("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let provider = make_provider();
        provider
            .set("key1", "value1", Duration::from_secs(60))
            .await
            .unwrap();
        provider.delete("key1").await.unwrap();
        assert!(!provider.exists("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_expire_individually() {
        let provider = make_provider();
        provider
            .set("short", "a", Duration::from_millis(150))
            .await
            .unwrap();
        provider
            .set("long", "b", Duration::from_secs(60))
            .await
            .unwrap();

        std::thread::sleep(Duration::from_millis(300));

        assert!(provider.get("short").await.unwrap().is_none());
        assert_eq!(provider.get("long").await.unwrap(), Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_zero_ttl_is_not_stored() {
        let provider = make_provider();
        provider.set("gone", "x", Duration::ZERO).await.unwrap();
        assert!(!provider.exists("gone").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_beyond_initial_capacity_survive_housekeeping() {
        let provider = make_provider();
        for i in 0..2000 {
            provider
                .set(&format!("k{i}"), "v", Duration::from_secs(60))
                .await
                .unwrap();
        }

        provider.cache.run_pending_tasks().await;

        for i in 0..2000 {
            assert!(provider.exists(&format!("k{i}")).await.unwrap(), "k{i} was evicted");
        }
    }
}
