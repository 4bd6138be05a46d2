use std::time::Duration;

use serde::{Deserialize, Serialize};

use etude::cache::CacheService;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
struct CachedUser {
    id: u32,
    email: String,
}

const NS: &str = "users-list";

#[tokio::test]
async fn test_in_memory_cache_basic_operations() {
    let cache = CacheService::in_memory("etude-cache");

    // Initially, key should not exist
    let result = cache.get(NS, "test_key").await.unwrap();
    assert!(result.is_none());

    cache
        .set(NS, "test_key", "test_value", None)
        .await
        .expect("Failed to set");

    let result = cache.get(NS, "test_key").await.unwrap();
    assert_eq!(result, Some("test_value".to_string()));

    let exists = cache.exists(NS, "test_key").await.unwrap();
    assert!(exists);

    let deleted = cache.del(NS, "test_key").await.unwrap();
    assert!(deleted);

    let result = cache.get(NS, "test_key").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_cache_json_round_trip() {
    let cache = CacheService::in_memory("etude-cache");

    let user = CachedUser {
        id: 1,
        email: "john@example.com".to_string(),
    };

    cache
        .set_json(NS, "user:1", &user, None)
        .await
        .expect("Failed to set JSON");

    let retrieved: Option<CachedUser> = cache.get_json(NS, "user:1").await.unwrap();
    assert_eq!(retrieved, Some(user));

    let missing: Option<CachedUser> = cache.get_json(NS, "user:999").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_cache_entry_expires_after_ttl() {
    let cache = CacheService::in_memory("etude-cache");

    cache
        .set(NS, "expiring_key", "value", Some(Duration::from_millis(100)))
        .await
        .expect("Failed to set with TTL");

    let result = cache.get(NS, "expiring_key").await.unwrap();
    assert_eq!(result, Some("value".to_string()));

    tokio::time::sleep(Duration::from_millis(150)).await;

    let result = cache.get(NS, "expiring_key").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_invalidate_clears_only_its_namespace() {
    let cache = CacheService::in_memory("etude-cache");

    cache.set(NS, "page-1", "a", None).await.unwrap();
    cache.set(NS, "page-2", "b", None).await.unwrap();
    cache.set("other", "page-1", "c", None).await.unwrap();

    cache.invalidate(NS).await.expect("Failed to invalidate");

    assert!(cache.get(NS, "page-1").await.unwrap().is_none());
    assert!(cache.get(NS, "page-2").await.unwrap().is_none());
    assert_eq!(
        cache.get("other", "page-1").await.unwrap(),
        Some("c".to_string())
    );
}

#[tokio::test]
async fn test_invalidate_is_idempotent() {
    let cache = CacheService::in_memory("etude-cache");

    cache.set(NS, "page-1", "a", None).await.unwrap();

    // Invalidating twice in a row: no error, same end state as once
    cache.invalidate(NS).await.expect("First invalidate failed");
    cache.invalidate(NS).await.expect("Second invalidate failed");

    assert!(cache.get(NS, "page-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_noop_cache_never_stores() {
    let cache = CacheService::noop();

    cache
        .set(NS, "key", "value", Some(Duration::from_secs(60)))
        .await
        .expect("Set must not error");

    // Every read misses; call sites cannot tell the backend is absent
    assert!(cache.get(NS, "key").await.unwrap().is_none());
    assert!(!cache.exists(NS, "key").await.unwrap());
    assert!(!cache.del(NS, "key").await.unwrap());
}

#[tokio::test]
async fn test_noop_invalidate_is_safe_and_idempotent() {
    let cache = CacheService::noop();

    cache.invalidate(NS).await.expect("First invalidate failed");
    cache.invalidate(NS).await.expect("Second invalidate failed");
}

#[tokio::test]
async fn test_cache_concurrent_access() {
    let cache = CacheService::in_memory("etude-cache");

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let key = format!("key_{}", i);
                let value = format!("value_{}", i);
                cache.set(NS, &key, &value, None).await.unwrap();
                let retrieved = cache.get(NS, &key).await.unwrap();
                assert_eq!(retrieved, Some(value));
            })
        })
        .collect();

    for task in tasks {
        task.await.expect("Task panicked");
    }
}

#[tokio::test]
async fn test_cache_flush() {
    let cache = CacheService::in_memory("etude-cache");

    cache.set(NS, "key1", "value1", None).await.unwrap();
    cache.set("other", "key2", "value2", None).await.unwrap();

    cache.flush().await.expect("Failed to flush");

    assert!(!cache.exists(NS, "key1").await.unwrap());
    assert!(!cache.exists("other", "key2").await.unwrap());
}
