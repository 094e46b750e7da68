// ABOUTME: Deterministic cache key builder and result-cache abstraction for analytic queries
// ABOUTME: Canonicalized digest over (statement, params, user, target, pagination, limits)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Result Cache
//!
//! A thin TTL cache wraps the execution collaborator: the gate derives a
//! deterministic digest from the canonicalized request, looks it up, and
//! stores the payload on a miss. TTL expiry is the sole invalidation
//! mechanism - a deliberate trade-off for slowly-changing analytic
//! sources. Concurrent misses for the same key are not deduplicated; put a
//! single-flight layer in front if execution is expensive.

/// In-memory TTL cache implementation
pub mod memory;

use crate::constants::cache::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CLEANUP_INTERVAL_SECS, DEFAULT_RESULT_TTL_SECS,
};
use crate::errors::GateResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

/// Page window requested by the dashboard renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number
    pub page: u32,
    /// Rows per page
    pub per_page: u32,
}

/// Execution limits forwarded to the execution collaborator.
///
/// Limits shape the result set, so they participate in the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLimits {
    /// Statement timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum rows returned
    pub max_rows: u64,
}

/// Deterministic 256-bit digest identifying one cacheable query result.
///
/// Equal canonical inputs always produce equal digests, independent of
/// parameter-map insertion order. Omitted optional fields serialize as
/// JSON `null` so the digest input space is total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryCacheKey(String);

impl QueryCacheKey {
    /// Build the digest from canonicalized inputs.
    ///
    /// The canonical form is a JSON object with sorted parameter keys.
    /// JSON escaping keeps every field unambiguous: neither statement text
    /// nor parameter keys can forge a field or entry boundary, so distinct
    /// inputs never share a canonical serialization.
    #[must_use]
    pub fn build(
        statement: &str,
        params: &Map<String, Value>,
        user_id: Option<&str>,
        target: Option<&str>,
        pagination: Option<Pagination>,
        limits: Option<ExecutionLimits>,
    ) -> Self {
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort_unstable();
        let mut sorted = Map::new();
        for key in keys {
            if let Some(value) = params.get(key) {
                sorted.insert(key.clone(), value.clone());
            }
        }
        let canonical = serde_json::json!({
            "stmt": statement,
            "params": sorted,
            "user": user_id,
            "target": target,
            "page": pagination,
            "limits": limits,
        });

        let digest = Sha256::digest(canonical.to_string().as_bytes());
        Self(hex::encode(digest))
    }

    /// Hex form of the digest.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result-cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached results
    pub max_entries: usize,
    /// Interval between expired-entry sweeps
    pub cleanup_interval: Duration,
    /// TTL applied when the caller does not pass one
    pub default_ttl: Duration,
    /// Enable the background cleanup task (disable in tests)
    pub enable_background_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
            default_ttl: Duration::from_secs(DEFAULT_RESULT_TTL_SECS),
            enable_background_cleanup: true,
        }
    }
}

/// Point-in-time counters for cache observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatsSnapshot {
    /// Lookups that returned a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries displaced by the capacity bound
    pub evictions: u64,
}

/// Pluggable result-cache backend.
///
/// Get/set are atomic at key granularity. There is no explicit
/// invalidation: entries leave by TTL expiry or LRU displacement only.
#[async_trait::async_trait]
pub trait ResultCache: Send + Sync + Clone {
    /// Store a serialized payload under the digest with the given TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &QueryCacheKey,
        value: &T,
        ttl: Duration,
    ) -> GateResult<()>;

    /// Retrieve a payload; `None` on miss or expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        key: &QueryCacheKey,
    ) -> GateResult<Option<T>>;

    /// Whether a live entry exists for the key.
    async fn exists(&self, key: &QueryCacheKey) -> bool;

    /// Remaining TTL for the key, if present and live.
    async fn ttl(&self, key: &QueryCacheKey) -> Option<Duration>;

    /// Counter snapshot for health endpoints.
    fn stats(&self) -> CacheStatsSnapshot;

    /// Drop every entry (testing/admin).
    async fn clear_all(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params_in_order(pairs: &[(&str, Value)]) -> Map<String, Value> {
        let mut map = Map::new();
        for (k, v) in pairs {
            map.insert((*k).to_owned(), v.clone());
        }
        map
    }

    #[test]
    fn key_is_independent_of_param_insertion_order() {
        let sql = "SELECT * FROM t WHERE a = ${a} AND b = ${b}";
        let forward = params_in_order(&[("a", json!(1)), ("b", json!(2))]);
        let reverse = params_in_order(&[("b", json!(2)), ("a", json!(1))]);
        let k1 = QueryCacheKey::build(sql, &forward, Some("u1"), Some("db1"), None, None);
        let k2 = QueryCacheKey::build(sql, &reverse, Some("u1"), Some("db1"), None, None);
        assert_eq!(k1, k2);
    }

    #[test]
    fn separator_characters_in_param_keys_do_not_collide() {
        let sql = "SELECT 1";
        let smuggled = params_in_order(&[("a=1&b", json!("x"))]);
        let plain = params_in_order(&[("a", json!(1)), ("b", json!("x"))]);
        assert_ne!(
            QueryCacheKey::build(sql, &smuggled, None, None, None, None),
            QueryCacheKey::build(sql, &plain, None, None, None, None)
        );
    }

    #[test]
    fn statement_text_cannot_forge_scope_fields() {
        let params = Map::new();
        let embedded =
            QueryCacheKey::build("SELECT 1\",\"user\":\"u1", &params, None, None, None, None);
        let scoped = QueryCacheKey::build("SELECT 1", &params, Some("u1"), None, None, None);
        assert_ne!(embedded, scoped);
    }

    #[test]
    fn key_differs_per_user() {
        let sql = "SELECT 1";
        let params = Map::new();
        let k1 = QueryCacheKey::build(sql, &params, Some("u1"), Some("db1"), None, None);
        let k2 = QueryCacheKey::build(sql, &params, Some("u2"), Some("db1"), None, None);
        assert_ne!(k1, k2);
    }

    #[test]
    fn omitted_fields_use_sentinels_not_absence() {
        let sql = "SELECT 1";
        let params = Map::new();
        let without = QueryCacheKey::build(sql, &params, None, None, None, None);
        let with_page = QueryCacheKey::build(
            sql,
            &params,
            None,
            None,
            Some(Pagination {
                page: 1,
                per_page: 50,
            }),
            None,
        );
        assert_ne!(without, with_page);
        let again = QueryCacheKey::build(sql, &params, None, None, None, None);
        assert_eq!(without, again);
    }

    #[test]
    fn limits_participate_in_the_key() {
        let sql = "SELECT 1";
        let params = Map::new();
        let a = QueryCacheKey::build(
            sql,
            &params,
            None,
            None,
            None,
            Some(ExecutionLimits {
                timeout_ms: 1000,
                max_rows: 100,
            }),
        );
        let b = QueryCacheKey::build(
            sql,
            &params,
            None,
            None,
            None,
            Some(ExecutionLimits {
                timeout_ms: 1000,
                max_rows: 500,
            }),
        );
        assert_ne!(a, b);
    }

    #[test]
    fn digest_is_256_bit_hex() {
        let key = QueryCacheKey::build("SELECT 1", &Map::new(), None, None, None, None);
        assert_eq!(key.as_hex().len(), 64);
        assert!(key.as_hex().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
