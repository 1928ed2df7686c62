//! Optional cache for idempotent GET responses
//!
//! When disabled every call goes straight to the loader. Store failures are
//! logged and treated as a miss.
//!
//! Every resource has a generation counter that is folded into its keys.
//! `invalidate` bumps the counter before deleting the old entries, so a load
//! that was already running when the data changed writes under a generation
//! nobody reads anymore.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use redis::{AsyncCommands, AsyncIter, Client};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::CacheConfig,
    error::{AppError, AppResult},
};

/// Keys deleted per `DEL` while invalidating
const DELETE_BATCH: usize = 500;

/// Key/value operations the response cache needs from its backing store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()>;

    /// Current value of a counter, 0 when it was never incremented
    async fn counter(&self, key: &str) -> AppResult<i64>;

    /// Increment a counter and return the new value
    async fn increment(&self, key: &str) -> AppResult<i64>;

    /// Delete every key starting with `prefix`, returning how many went
    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64>;
}

fn redis_error(e: redis::RedisError) -> AppError {
    AppError::Internal(format!("Redis error: {}", e))
}

/// Redis store over a multiplexed connection per call
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(redis_error)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get(key).await.map_err(redis_error)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(redis_error)
    }

    async fn counter(&self, key: &str) -> AppResult<i64> {
        let mut conn = self.connection().await?;
        let value: Option<i64> = conn.get(key).await.map_err(redis_error)?;
        Ok(value.unwrap_or(0))
    }

    async fn increment(&self, key: &str) -> AppResult<i64> {
        let mut conn = self.connection().await?;
        conn.incr(key, 1).await.map_err(redis_error)
    }

    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64> {
        let mut conn = self.connection().await?;

        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter: AsyncIter<'_, String> = conn
                .scan_match(format!("{}*", prefix))
                .await
                .map_err(redis_error)?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        let mut deleted = 0;
        for batch in keys.chunks(DELETE_BATCH) {
            let removed: u64 = conn.del(batch.to_vec()).await.map_err(redis_error)?;
            deleted += removed;
        }
        Ok(deleted)
    }
}

#[derive(Default)]
struct MemoryEntries {
    values: HashMap<String, (String, Instant)>,
    counters: HashMap<String, i64>,
}

/// In-process store with the same semantics as Redis, for tests and single-node runs
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<MemoryEntries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live value keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .lock()
            .values
            .iter()
            .filter(|(_, (_, expires))| *expires > now)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryEntries> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut entries = self.lock();
        let expired = match entries.values.get(key) {
            Some((value, expires)) if *expires > Instant::now() => return Ok(Some(value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.values.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        let expires = Instant::now() + Duration::from_secs(ttl_seconds);
        self.lock()
            .values
            .insert(key.to_string(), (value.to_string(), expires));
        Ok(())
    }

    async fn counter(&self, key: &str) -> AppResult<i64> {
        Ok(self.lock().counters.get(key).copied().unwrap_or(0))
    }

    async fn increment(&self, key: &str) -> AppResult<i64> {
        let mut entries = self.lock();
        let counter = entries.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64> {
        let mut entries = self.lock();
        let before = entries.values.len();
        entries.values.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.values.len()) as u64)
    }
}

#[derive(Clone)]
struct Backend {
    store: Arc<dyn CacheStore>,
    ttl_seconds: u64,
}

#[derive(Clone, Default)]
pub struct ResponseCache {
    backend: Option<Backend>,
}

/// Prefix shared by every cached response of `resource`
pub fn resource_prefix(resource: &str) -> String {
    format!("cache:{}:", resource)
}

/// Cache key for a response of `resource` at `path_and_query` in a given generation
pub fn cache_key(resource: &str, generation: i64, path_and_query: &str) -> String {
    format!("{}g{}:{}", resource_prefix(resource), generation, path_and_query)
}

/// Counter key; lives outside the resource prefix so invalidation never resets it
pub fn generation_key(resource: &str) -> String {
    format!("cachegen:{}", resource)
}

impl ResponseCache {
    /// Pass-through cache
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Cache over an arbitrary store
    pub fn with_store(store: Arc<dyn CacheStore>, ttl_seconds: u64) -> Self {
        Self {
            backend: Some(Backend { store, ttl_seconds }),
        }
    }

    /// Connect to Redis when enabled in the configuration
    pub async fn from_config(config: &CacheConfig) -> AppResult<Self> {
        if !config.enabled {
            return Ok(Self::disabled());
        }

        let client = Client::open(config.redis_url.as_str())
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self::with_store(
            Arc::new(RedisStore::new(client)),
            config.ttl_seconds,
        ))
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Serve from cache, or run `load` and remember its result
    pub async fn get_or_load<T, F, Fut>(
        &self,
        resource: &str,
        path_and_query: &str,
        load: F,
    ) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let Some(backend) = &self.backend else {
            return load().await;
        };

        // Read before loading: the entry is filed under the data's generation
        let generation = match backend.store.counter(&generation_key(resource)).await {
            Ok(generation) => generation,
            Err(e) => {
                tracing::warn!(resource, "cache generation read failed: {}", e);
                return load().await;
            }
        };

        let key = cache_key(resource, generation, path_and_query);
        match backend.store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    tracing::debug!(key = %key, "cache hit");
                    return Ok(value);
                }
                Err(e) => tracing::warn!(key = %key, "discarding undecodable cache entry: {}", e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %key, "cache read failed: {}", e),
        }

        let value = load().await?;
        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = backend.store.set(&key, &raw, backend.ttl_seconds).await {
                    tracing::warn!(key = %key, "cache write failed: {}", e);
                }
            }
            Err(e) => tracing::warn!(key = %key, "cache encode failed: {}", e),
        }
        Ok(value)
    }

    /// Drop every cached response of `resource`
    pub async fn invalidate(&self, resource: &str) {
        let Some(backend) = &self.backend else {
            return;
        };
        if let Err(e) = backend.store.increment(&generation_key(resource)).await {
            tracing::warn!(resource, "cache generation bump failed: {}", e);
        }
        match backend.store.delete_prefix(&resource_prefix(resource)).await {
            Ok(deleted) => tracing::debug!(resource, deleted, "cache invalidated"),
            Err(e) => tracing::warn!(resource, "cache invalidation failed: {}", e),
        }
    }
}
