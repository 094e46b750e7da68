// ABOUTME: In-memory result cache with LRU eviction, TTL expiry, and hit/miss counters
// ABOUTME: Optional background cleanup task sweeping expired entries
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{CacheConfig, CacheStatsSnapshot, QueryCacheKey, ResultCache};
use crate::errors::{GateError, GateResult, IssueCode};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Cached payload with its expiry instant
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn remaining_ttl(&self) -> Option<Duration> {
        self.expires_at.checked_duration_since(Instant::now())
    }
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// In-memory result cache.
///
/// `Arc<RwLock<LruCache>>` shares the store between request handlers and
/// the background cleanup task. `LruCache` bounds memory: when the
/// capacity is reached the least-recently-used result is displaced.
#[derive(Clone)]
pub struct InMemoryResultCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
    counters: Arc<CacheCounters>,
    shutdown_tx: Option<Arc<tokio::sync::mpsc::Sender<()>>>,
}

impl InMemoryResultCache {
    /// Fallback capacity when configuration asks for zero entries
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create the cache, spawning the cleanup task when enabled.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CAPACITY);
        let store = Arc::new(RwLock::new(LruCache::new(capacity)));

        let shutdown_tx = if config.enable_background_cleanup {
            let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
            let store_clone = Arc::clone(&store);
            let cleanup_interval = config.cleanup_interval;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(cleanup_interval);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            Self::cleanup_expired(&store_clone).await;
                        }
                        _ = shutdown_rx.recv() => {
                            tracing::debug!("result cache cleanup task shutting down");
                            break;
                        }
                    }
                }
            });

            Some(Arc::new(shutdown_tx))
        } else {
            None
        };

        Self {
            store,
            counters: Arc::new(CacheCounters::default()),
            shutdown_tx,
        }
    }

    async fn cleanup_expired(store: &Arc<RwLock<LruCache<String, CacheEntry>>>) {
        let mut guard = store.write().await;
        let expired: Vec<String> = guard
            .iter()
            .filter_map(|(k, v)| v.is_expired().then(|| k.clone()))
            .collect();
        for key in &expired {
            guard.pop(key);
        }
        let removed = expired.len();
        drop(guard);
        if removed > 0 {
            tracing::debug!(removed, "swept expired result cache entries");
        }
    }
}

#[async_trait::async_trait]
impl ResultCache for InMemoryResultCache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &QueryCacheKey,
        value: &T,
        ttl: Duration,
    ) -> GateResult<()> {
        let serialized = serde_json::to_vec(value).map_err(|e| {
            tracing::error!(error = %e, "failed to serialize cache payload");
            GateError::single(IssueCode::UnknownError, "cache serialization failed")
        })?;
        let entry = CacheEntry::new(serialized, ttl);

        let mut store = self.store.write().await;
        let displacing = store.len() == store.cap().get() && !store.contains(key.as_hex());
        store.put(key.as_hex().to_owned(), entry);
        drop(store);
        if displacing {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        key: &QueryCacheKey,
    ) -> GateResult<Option<T>> {
        let mut store = self.store.write().await;
        let Some(entry) = store.get(key.as_hex()) else {
            drop(store);
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };
        if entry.is_expired() {
            store.pop(key.as_hex());
            drop(store);
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }
        let data = entry.data.clone();
        drop(store);
        self.counters.hits.fetch_add(1, Ordering::Relaxed);

        serde_json::from_slice(&data).map(Some).map_err(|e| {
            tracing::error!(error = %e, "failed to deserialize cache payload");
            GateError::single(IssueCode::UnknownError, "cache deserialization failed")
        })
    }

    async fn exists(&self, key: &QueryCacheKey) -> bool {
        let store = self.store.read().await;
        store
            .peek(key.as_hex())
            .is_some_and(|entry| !entry.is_expired())
    }

    async fn ttl(&self, key: &QueryCacheKey) -> Option<Duration> {
        let store = self.store.read().await;
        store.peek(key.as_hex()).and_then(CacheEntry::remaining_ttl)
    }

    fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    async fn clear_all(&self) {
        self.store.write().await.clear();
    }
}

impl Drop for InMemoryResultCache {
    fn drop(&mut self) {
        if let Some(tx) = &self.shutdown_tx {
            // Last handle going away stops the cleanup task
            if Arc::strong_count(tx) == 1 {
                let _ = tx.try_send(());
            }
        }
    }
}
