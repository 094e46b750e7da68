// ABOUTME: Unit tests for the in-memory result cache
// ABOUTME: Tests TTL expiration, LRU displacement, counters, and clear
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use anyhow::Result;
use query_gate::{CacheConfig, InMemoryResultCache, QueryCacheKey, ResultCache};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ResultRows {
    columns: Vec<String>,
    row_count: u32,
}

fn sample_rows() -> ResultRows {
    ResultRows {
        columns: vec!["device".to_owned(), "reading_count".to_owned()],
        row_count: 42,
    }
}

/// Helper: key for a distinct statement text
fn key_for(statement: &str) -> QueryCacheKey {
    QueryCacheKey::build(statement, &Map::new(), Some("u1"), Some("db1"), None, None)
}

/// Helper: cache with background cleanup off to avoid runtime conflicts
fn test_cache(max_entries: usize) -> InMemoryResultCache {
    InMemoryResultCache::new(&CacheConfig {
        max_entries,
        cleanup_interval: Duration::from_secs(300),
        default_ttl: Duration::from_secs(900),
        enable_background_cleanup: false,
    })
}

#[tokio::test]
async fn set_and_get_round_trips_payload() -> Result<()> {
    let cache = test_cache(100);
    let key = key_for("SELECT 1");
    let data = sample_rows();

    cache.set(&key, &data, Duration::from_secs(10)).await?;
    let retrieved: Option<ResultRows> = cache.get(&key).await?;
    assert_eq!(retrieved, Some(data));

    Ok(())
}

#[tokio::test]
async fn expired_entry_reads_as_miss() -> Result<()> {
    let cache = test_cache(100);
    let key = key_for("SELECT 2");

    cache
        .set(&key, &sample_rows(), Duration::from_millis(30))
        .await?;
    assert!(cache.exists(&key).await);

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert!(!cache.exists(&key).await);
    let retrieved: Option<ResultRows> = cache.get(&key).await?;
    assert_eq!(retrieved, None);

    Ok(())
}

#[tokio::test]
async fn lru_displacement_evicts_least_recently_used() -> Result<()> {
    let cache = test_cache(2);
    let k1 = key_for("SELECT 1");
    let k2 = key_for("SELECT 2");
    let k3 = key_for("SELECT 3");
    let ttl = Duration::from_secs(60);

    cache.set(&k1, &sample_rows(), ttl).await?;
    cache.set(&k2, &sample_rows(), ttl).await?;
    // Touch k1 so k2 becomes the displacement candidate
    let _: Option<ResultRows> = cache.get(&k1).await?;
    cache.set(&k3, &sample_rows(), ttl).await?;

    assert!(cache.exists(&k1).await);
    assert!(!cache.exists(&k2).await);
    assert!(cache.exists(&k3).await);
    assert_eq!(cache.stats().evictions, 1);

    Ok(())
}

#[tokio::test]
async fn counters_track_hits_and_misses() -> Result<()> {
    let cache = test_cache(100);
    let key = key_for("SELECT 4");

    let miss: Option<ResultRows> = cache.get(&key).await?;
    assert_eq!(miss, None);

    cache
        .set(&key, &sample_rows(), Duration::from_secs(10))
        .await?;
    let _: Option<ResultRows> = cache.get(&key).await?;
    let _: Option<ResultRows> = cache.get(&key).await?;

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.evictions, 0);

    Ok(())
}

#[tokio::test]
async fn ttl_reports_remaining_time() -> Result<()> {
    let cache = test_cache(100);
    let key = key_for("SELECT 5");

    cache
        .set(&key, &sample_rows(), Duration::from_secs(60))
        .await?;
    let remaining = cache.ttl(&key).await.map_or(0, |d| d.as_secs());
    assert!(remaining > 55 && remaining <= 60);

    assert_eq!(cache.ttl(&key_for("SELECT absent")).await, None);

    Ok(())
}

#[tokio::test]
async fn clear_all_drops_every_entry() -> Result<()> {
    let cache = test_cache(100);
    let k1 = key_for("SELECT 6");
    let k2 = key_for("SELECT 7");
    let ttl = Duration::from_secs(60);

    cache.set(&k1, &sample_rows(), ttl).await?;
    cache.set(&k2, &sample_rows(), ttl).await?;
    cache.clear_all().await;

    assert!(!cache.exists(&k1).await);
    assert!(!cache.exists(&k2).await);

    Ok(())
}

#[tokio::test]
async fn overwrite_under_same_key_is_not_an_eviction() -> Result<()> {
    let cache = test_cache(2);
    let key = key_for("SELECT 8");
    let ttl = Duration::from_secs(60);

    cache.set(&key, &sample_rows(), ttl).await?;
    cache.set(&key, &sample_rows(), ttl).await?;
    assert_eq!(cache.stats().evictions, 0);

    Ok(())
}

#[tokio::test]
async fn clones_share_one_store() -> Result<()> {
    let cache = test_cache(100);
    let clone = cache.clone();
    let key = key_for("SELECT 9");

    cache
        .set(&key, &sample_rows(), Duration::from_secs(10))
        .await?;
    assert!(clone.exists(&key).await);

    Ok(())
}
