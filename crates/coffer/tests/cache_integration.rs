//! Integration tests for the cache abstraction over the local backend
//!
//! Exercises the full stack the way a host application would: manager,
//! config resolution, codecs, backend and decorator together. The remote
//! counterpart of these scenarios lives in `remote_integration.rs`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use coffer::cache::{AsyncCache, AsyncCacheExt, Cache, CacheExt};
use coffer::config::{CacheConfig, LocalCacheConfig, ManagerConfig};
use coffer::manager::{CacheContext, CacheManager};
use coffer::CacheError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ComplexKey {
    field1: String,
    field2: i32,
}

coffer::composite_key!(ComplexKey);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ComplexValue {
    field1: i64,
    field2: String,
    field3: Vec<i32>,
}

fn local_ttl(secs: u64) -> CacheConfig {
    CacheConfig::Local(LocalCacheConfig::new().with_ttl(Duration::from_secs(secs)))
}

/// Verifies that cached data is retrievable until its TTL elapses.
///
/// This is the canonical scenario: create a local cache "sessions" with a
/// 1 second TTL, write, read back, wait past the TTL, observe absence.
///
/// # Test Steps
/// 1. Put a value and read it back immediately
/// 2. Verify an unwritten key reads as `None`
/// 3. Wait 1.2 s with no further writes
/// 4. Verify the entry now reads as `None`
#[tokio::test]
async fn test_cache_and_retrieve_until_ttl() -> Result<()> {
    let manager = CacheManager::new()?;
    let sessions = manager
        .get_async::<String, i32>("sessions", CacheContext::of_default(local_ttl(1)))
        .await?;

    sessions.put(&"u1".to_string(), &42).await?;
    assert_eq!(sessions.get(&"u1".to_string()).await?, Some(42));
    assert_eq!(sessions.get(&"u2".to_string()).await?, None);
    assert!(sessions.contains_key(&"u1".to_string()).await?);

    tokio::time::sleep(Duration::from_millis(1200)).await;

    assert_eq!(sessions.get(&"u1".to_string()).await?, None);
    assert!(!sessions.contains_key(&"u1".to_string()).await?);

    manager.close().await;
    Ok(())
}

/// Verifies that a put resets the TTL from the write, not from the last
/// read (absolute-since-write, never sliding).
///
/// # Test Steps
/// 1. Put with a 1 s TTL, read at 600 ms (read must not extend life)
/// 2. Overwrite at 700 ms, which restarts the lifetime
/// 3. Verify the value is still present at 1.4 s (past the first write's
///    TTL, within the second's)
#[tokio::test]
async fn test_put_restarts_ttl() -> Result<()> {
    let manager = CacheManager::new()?;
    let cache = manager
        .get_async::<String, i32>("ttl-reset", CacheContext::of_default(local_ttl(1)))
        .await?;

    cache.put(&"k".to_string(), &1).await?;
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(cache.get(&"k".to_string()).await?, Some(1));

    tokio::time::sleep(Duration::from_millis(100)).await;
    cache.put(&"k".to_string(), &2).await?;

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(cache.get(&"k".to_string()).await?, Some(2));

    manager.close().await;
    Ok(())
}

/// Verifies that caches with different names never interact, even for
/// colliding raw keys.
///
/// # Test Steps
/// 1. Create caches "cache-a" and "cache-b" from one manager
/// 2. Fill "cache-a"
/// 3. Verify "cache-b" observes none of it
#[tokio::test]
async fn test_caches_should_not_interact() -> Result<()> {
    let manager = CacheManager::new()?;
    let cache_a = manager
        .get_async::<String, i32>("cache-a", CacheContext::of_default(local_ttl(60)))
        .await?;
    let cache_b = manager
        .get_async::<String, i32>("cache-b", CacheContext::of_default(local_ttl(60)))
        .await?;

    cache_a.put(&"k1".to_string(), &1).await?;
    cache_a.put(&"k2".to_string(), &2).await?;

    assert_eq!(cache_a.get(&"k1".to_string()).await?, Some(1));
    assert_eq!(cache_b.get(&"k1".to_string()).await?, None);
    assert!(!cache_b.contains_key(&"k2".to_string()).await?);
    assert!(cache_b.keys().await?.is_empty());

    manager.close().await;
    Ok(())
}

/// Verifies key enumeration returns exactly the live keys, independent of
/// call order and repetition, across simple and composite key types.
///
/// # Test Steps
/// 1. Fill a UUID-keyed cache and a composite-keyed cache
/// 2. Fetch keys twice from each
/// 3. Compare as sets against the written keys
#[tokio::test]
async fn test_cached_keys_should_be_retrievable() -> Result<()> {
    let manager = CacheManager::new()?;

    let by_id = manager
        .get_async::<Uuid, String>("by-id", CacheContext::of_default(local_ttl(60)))
        .await?;
    let id1 = Uuid::new_v4();
    let id2 = Uuid::new_v4();
    by_id.put(&id1, &"one".to_string()).await?;
    by_id.put(&id2, &"two".to_string()).await?;

    for _ in 0..2 {
        let mut keys = by_id.keys().await?;
        keys.sort();
        let mut expected = vec![id1, id2];
        expected.sort();
        assert_eq!(keys, expected);
    }

    let complex = manager
        .get_async::<ComplexKey, ComplexValue>("complex", CacheContext::of_default(local_ttl(60)))
        .await?;
    let key1 = ComplexKey { field1: "a".into(), field2: 1 };
    let key2 = ComplexKey { field1: "b".into(), field2: 2 };
    let value = ComplexValue { field1: 1, field2: "v".into(), field3: vec![1, 2] };
    complex.put(&key1, &value).await?;
    complex.put(&key2, &value).await?;

    let mut keys = complex.keys().await?;
    keys.sort_by(|a, b| a.field1.cmp(&b.field1));
    assert_eq!(keys, vec![key1.clone(), key2]);

    assert_eq!(complex.get(&key1).await?, Some(value));

    manager.close().await;
    Ok(())
}

/// Verifies populate-on-miss: the supplier runs exactly once, its result
/// is cached, and a cached value short-circuits later (failing) suppliers.
///
/// # Test Steps
/// 1. `get_through` on a miss, supplier returns 42
/// 2. `get_through` again with a supplier that must not run
/// 3. `get_through_future` with a failing supplier on a fresh key:
///    failure propagates, nothing is cached
#[tokio::test]
async fn test_get_through_populates_once() -> Result<()> {
    let manager = CacheManager::new()?;
    let cache = manager
        .get_async::<String, i32>("through", CacheContext::of_default(local_ttl(60)))
        .await?;
    let key = "k".to_string();

    let value = cache.get_through(&key, || Ok(42)).await?;
    assert_eq!(value, 42);
    assert_eq!(cache.get(&key).await?, Some(42));

    let value = cache
        .get_through(&key, || Err("cached value expected".into()))
        .await?;
    assert_eq!(value, 42);

    let fresh = "fresh".to_string();
    let failed = cache
        .get_through_future(&fresh, || async { Err("boom".into()) })
        .await;
    assert!(matches!(failed, Err(CacheError::Supplier(_))));
    assert_eq!(cache.get(&fresh).await?, None);

    manager.close().await;
    Ok(())
}

/// Verifies the stampede exposure documented on `get_through_future`:
/// without single-flight, N concurrent misses each run their supplier and
/// the cache ends up with one of their (identical) results.
///
/// # Test Steps
/// 1. Launch 8 concurrent `get_through_future` calls on one absent key
/// 2. Verify every call returned the supplied value
/// 3. Verify the supplier ran at least once (and possibly up to 8 times)
#[tokio::test]
async fn test_concurrent_get_through_has_no_single_flight() -> Result<()> {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let manager = Arc::new(CacheManager::new()?);
    let cache = Arc::new(
        manager
            .get_async::<String, i32>("stampede", CacheContext::of_default(local_ttl(60)))
            .await?,
    );
    let calls = Arc::new(AtomicUsize::new(0));

    let mut tasks = vec![];
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        tasks.push(tokio::spawn(async move {
            cache
                .get_through_future(&"hot".to_string(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(7)
                })
                .await
        }));
    }

    for task in tasks {
        assert_eq!(task.await??, 7);
    }

    let supplier_runs = calls.load(std::sync::atomic::Ordering::SeqCst);
    assert!(supplier_runs >= 1);
    assert_eq!(cache.get(&"hot".to_string()).await?, Some(7));

    manager.close().await;
    Ok(())
}

/// Verifies that concurrent requests for the same cache name share one
/// underlying engine.
///
/// # Test Steps
/// 1. Request the same name from 8 concurrent tasks
/// 2. Verify the engine creation counter stayed at 1
/// 3. Verify a write through one handle is visible through another
#[tokio::test]
async fn test_concurrent_handles_share_one_engine() -> Result<()> {
    let manager = Arc::new(CacheManager::new()?);

    let mut tasks = vec![];
    for _ in 0..8 {
        let manager = Arc::clone(&manager);
        tasks.push(tokio::spawn(async move {
            manager
                .get_async::<String, i32>("shared", CacheContext::of_default(local_ttl(60)))
                .await
        }));
    }

    let mut handles = vec![];
    for task in tasks {
        handles.push(task.await??);
    }
    assert_eq!(manager.engines_created(), 1);

    handles[0].put(&"k".to_string(), &9).await?;
    assert_eq!(handles[7].get(&"k".to_string()).await?, Some(9));

    manager.close().await;
    Ok(())
}

/// Verifies the blocking facade end to end, including populate-on-miss
/// and clear, from a plain (non-runtime) thread.
///
/// # Test Steps
/// 1. Build a manager outside any runtime; request a sync handle
/// 2. Round-trip values, enumerate, populate on miss
/// 3. Clear and verify emptiness
#[test]
fn test_sync_facade_round_trip() -> Result<()> {
    let manager = CacheManager::new()?;
    let cache =
        manager.get_sync::<String, i32>("sync", CacheContext::of_default(local_ttl(60)))?;

    cache.put(&"k1".to_string(), &1)?;
    cache.put(&"k2".to_string(), &2)?;

    assert_eq!(cache.get(&"k1".to_string())?, Some(1));
    assert!(cache.contains_key(&"k2".to_string())?);

    let mut keys = cache.keys()?;
    keys.sort();
    assert_eq!(keys, vec!["k1".to_string(), "k2".to_string()]);

    assert_eq!(cache.get_through(&"k3".to_string(), || Ok(3))?, 3);

    cache.remove(&"k1".to_string())?;
    assert_eq!(cache.get(&"k1".to_string())?, None);

    cache.clear()?;
    assert!(cache.keys()?.is_empty());

    manager.close_blocking();
    assert!(matches!(cache.get(&"k2".to_string()), Err(CacheError::Closed)));
    Ok(())
}

/// Verifies that sync and async handles of the same name observe the same
/// underlying engine state.
///
/// # Test Steps
/// 1. Write through a sync handle
/// 2. Read through an async handle of the same name
#[test]
fn test_sync_and_async_handles_share_state() -> Result<()> {
    let manager = CacheManager::new()?;

    let sync_cache =
        manager.get_sync::<String, i32>("mixed", CacheContext::of_default(local_ttl(60)))?;
    sync_cache.put(&"k".to_string(), &5)?;

    // A second runtime outside the bridge drives the async handle.
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let value = runtime.block_on(async {
        let async_cache = manager
            .get_async::<String, i32>("mixed", CacheContext::of_default(local_ttl(60)))
            .await?;
        async_cache.get(&"k".to_string()).await
    })?;
    assert_eq!(value, Some(5));
    assert_eq!(manager.engines_created(), 1);

    manager.close_blocking();
    Ok(())
}

/// Verifies per-name config resolution precedence end to end: a named
/// entry beats the per-call override; the override applies to unlisted
/// names only.
///
/// # Test Steps
/// 1. Pin "pinned" to a 60 s TTL in the manager config
/// 2. Request "pinned" and "free" with a 1 s override
/// 3. After 1.3 s, "pinned" still holds its entry, "free" does not
#[tokio::test]
async fn test_config_resolution_precedence() -> Result<()> {
    let manager = CacheManager::with_config(
        ManagerConfig::new()
            .with_default_config(local_ttl(60))
            .with_cache_config("pinned", local_ttl(60)),
    )?;

    let pinned = manager
        .get_async::<String, i32>("pinned", CacheContext::of_default(local_ttl(1)))
        .await?;
    let free = manager
        .get_async::<String, i32>("free", CacheContext::of_default(local_ttl(1)))
        .await?;

    pinned.put(&"k".to_string(), &1).await?;
    free.put(&"k".to_string(), &1).await?;

    tokio::time::sleep(Duration::from_millis(1300)).await;

    assert_eq!(pinned.get(&"k".to_string()).await?, Some(1));
    assert_eq!(free.get(&"k".to_string()).await?, None);

    manager.close().await;
    Ok(())
}
