use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::EtudeError;

/// Cache backend trait for pluggable caching strategies.
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a raw value from the cache.
    async fn get(&self, key: &str) -> Result<Option<String>, EtudeError>;

    /// Set a raw value in the cache with optional TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), EtudeError>;

    /// Delete a key from the cache.
    async fn del(&self, key: &str) -> Result<bool, EtudeError>;

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> Result<bool, EtudeError>;

    /// Delete all keys starting with a prefix.
    async fn del_prefix(&self, prefix: &str) -> Result<(), EtudeError>;

    /// Flush all keys (use with caution).
    async fn flush(&self) -> Result<(), EtudeError>;
}

/// The cache policy object used by the application.
///
/// Entries live under `{prefix}:{namespace}:{key}`, and a namespace can be
/// invalidated as a unit. Which backend sits behind the service is decided
/// once at startup — when caching is disabled by configuration, or the
/// environment is `testing`, the no-op backend is selected and every call
/// site keeps the exact same get/compute/set shape. Handlers never branch
/// on configuration.
#[derive(Clone)]
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
    prefix: String,
}

impl CacheService {
    /// Create a cache service with the given backend.
    pub fn new(backend: impl CacheBackend + 'static, prefix: impl Into<String>) -> Self {
        CacheService {
            backend: Arc::new(backend),
            prefix: prefix.into(),
        }
    }

    /// In-memory cache (good for development and single-node deployments).
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        CacheService::new(InMemoryCache::new(), prefix)
    }

    /// No-op cache: every read misses, every write vanishes.
    pub fn noop() -> Self {
        CacheService::new(NoopCache, "")
    }

    fn full_key(&self, namespace: &str, key: &str) -> String {
        format!("{}:{}:{}", self.prefix, namespace, key)
    }

    /// Get a JSON-deserialized value from a namespace.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<T>, EtudeError> {
        match self.backend.get(&self.full_key(namespace, key)).await? {
            Some(raw) => {
                let value: T = serde_json::from_str(&raw).map_err(|e| {
                    EtudeError::Internal(format!("Cache deserialize error: {}", e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Store a JSON-serialized value in a namespace.
    pub async fn set_json<T: Serialize>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), EtudeError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| EtudeError::Internal(format!("Cache serialize error: {}", e)))?;
        self.backend
            .set(&self.full_key(namespace, key), &raw, ttl)
            .await
    }

    /// Get a raw string value from a namespace.
    pub async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, EtudeError> {
        self.backend.get(&self.full_key(namespace, key)).await
    }

    /// Store a raw string value in a namespace.
    pub async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), EtudeError> {
        self.backend
            .set(&self.full_key(namespace, key), value, ttl)
            .await
    }

    /// Delete a single entry.
    pub async fn del(&self, namespace: &str, key: &str) -> Result<bool, EtudeError> {
        self.backend.del(&self.full_key(namespace, key)).await
    }

    /// Check if an entry exists.
    pub async fn exists(&self, namespace: &str, key: &str) -> Result<bool, EtudeError> {
        self.backend.exists(&self.full_key(namespace, key)).await
    }

    /// Drop every entry under a namespace. Idempotent, and a no-op when the
    /// backing cache is absent.
    pub async fn invalidate(&self, namespace: &str) -> Result<(), EtudeError> {
        self.backend
            .del_prefix(&format!("{}:{}:", self.prefix, namespace))
            .await
    }

    /// Flush the entire cache.
    pub async fn flush(&self) -> Result<(), EtudeError> {
        self.backend.flush().await
    }
}

// ── No-op Cache Backend ──

/// Backend selected at startup when caching is disabled. Reads always miss
/// and writes are discarded, so decorated call sites behave identically
/// with caching on or off.
pub struct NoopCache;

#[async_trait::async_trait]
impl CacheBackend for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, EtudeError> {
        Ok(None)
    }

    async fn set(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Option<Duration>,
    ) -> Result<(), EtudeError> {
        Ok(())
    }

    async fn del(&self, _key: &str) -> Result<bool, EtudeError> {
        Ok(false)
    }

    async fn exists(&self, _key: &str) -> Result<bool, EtudeError> {
        Ok(false)
    }

    async fn del_prefix(&self, _prefix: &str) -> Result<(), EtudeError> {
        Ok(())
    }

    async fn flush(&self) -> Result<(), EtudeError> {
        Ok(())
    }
}

// ── In-Memory Cache Backend ──

/// Simple in-memory cache using a HashMap.
#[derive(Clone)]
pub struct InMemoryCache {
    store: Arc<RwLock<std::collections::HashMap<String, CacheEntry>>>,
}

#[derive(Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<std::time::Instant>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        InMemoryCache {
            store: Arc::new(RwLock::new(std::collections::HashMap::new())),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, EtudeError> {
        let store = self.store.read().await;
        match store.get(key) {
            Some(entry) => {
                if let Some(expires_at) = entry.expires_at {
                    if std::time::Instant::now() > expires_at {
                        drop(store);
                        self.store.write().await.remove(key);
                        return Ok(None);
                    }
                }
                Ok(Some(entry.value.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), EtudeError> {
        let expires_at = ttl.map(|d| std::time::Instant::now() + d);
        self.store.write().await.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, EtudeError> {
        Ok(self.store.write().await.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, EtudeError> {
        let store = self.store.read().await;
        match store.get(key) {
            Some(entry) => {
                if let Some(expires_at) = entry.expires_at {
                    Ok(std::time::Instant::now() <= expires_at)
                } else {
                    Ok(true)
                }
            }
            None => Ok(false),
        }
    }

    async fn del_prefix(&self, prefix: &str) -> Result<(), EtudeError> {
        self.store
            .write()
            .await
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }

    async fn flush(&self) -> Result<(), EtudeError> {
        self.store.write().await.clear();
        Ok(())
    }
}

// ── Redis Cache Backend ──

/// Redis-backed cache for multi-node deployments.
///
/// Requires a Redis connection URL (e.g., `redis://127.0.0.1:6379`).
#[cfg(feature = "redis")]
pub struct RedisCache {
    #[allow(dead_code)]
    client: redis::Client,
    pool: Arc<RwLock<redis::aio::MultiplexedConnection>>,
}

#[cfg(feature = "redis")]
impl RedisCache {
    /// Create a new Redis cache from a connection URL.
    pub async fn new(url: &str) -> Result<Self, EtudeError> {
        let client = redis::Client::open(url)
            .map_err(|e| EtudeError::Internal(format!("Redis connection error: {}", e)))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| EtudeError::Internal(format!("Redis connection error: {}", e)))?;
        Ok(RedisCache {
            client,
            pool: Arc::new(RwLock::new(conn)),
        })
    }
}

#[cfg(feature = "redis")]
#[async_trait::async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, EtudeError> {
        use redis::AsyncCommands;
        let mut conn = self.pool.write().await;
        let result: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| EtudeError::Internal(format!("Redis GET error: {}", e)))?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), EtudeError> {
        use redis::AsyncCommands;
        let mut conn = self.pool.write().await;
        if let Some(ttl) = ttl {
            let _: () = conn
                .set_ex(key, value, ttl.as_secs())
                .await
                .map_err(|e| EtudeError::Internal(format!("Redis SETEX error: {}", e)))?;
        } else {
            let _: () = conn
                .set(key, value)
                .await
                .map_err(|e| EtudeError::Internal(format!("Redis SET error: {}", e)))?;
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, EtudeError> {
        use redis::AsyncCommands;
        let mut conn = self.pool.write().await;
        let count: i64 = conn
            .del(key)
            .await
            .map_err(|e| EtudeError::Internal(format!("Redis DEL error: {}", e)))?;
        Ok(count > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, EtudeError> {
        use redis::AsyncCommands;
        let mut conn = self.pool.write().await;
        let exists: bool = conn
            .exists(key)
            .await
            .map_err(|e| EtudeError::Internal(format!("Redis EXISTS error: {}", e)))?;
        Ok(exists)
    }

    async fn del_prefix(&self, prefix: &str) -> Result<(), EtudeError> {
        use redis::AsyncCommands;
        let mut conn = self.pool.write().await;
        let pattern = format!("{}*", prefix);
        let keys: Vec<String> = conn
            .keys(&pattern)
            .await
            .map_err(|e| EtudeError::Internal(format!("Redis KEYS error: {}", e)))?;
        if !keys.is_empty() {
            let _: () = conn
                .del(keys)
                .await
                .map_err(|e| EtudeError::Internal(format!("Redis DEL error: {}", e)))?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), EtudeError> {
        let mut conn = self.pool.write().await;
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut *conn)
            .await
            .map_err(|e| EtudeError::Internal(format!("Redis FLUSHDB error: {}", e)))?;
        Ok(())
    }
}
