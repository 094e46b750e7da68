// ABOUTME: Environment-based configuration for the query gate
// ABOUTME: One immutable value constructed at startup and shared read-only
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::cache::{CacheConfig, ExecutionLimits};
use crate::constants::{cache, guard, limits};
use std::env;
use std::time::Duration;

/// Immutable gate configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Result-cache sizing and TTL
    pub cache: CacheConfig,
    /// Execution limits applied when a panel config specifies none
    pub default_limits: ExecutionLimits,
    /// Maximum SQL characters included in internal-failure log lines
    pub sql_excerpt_len: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            default_limits: ExecutionLimits {
                timeout_ms: limits::DEFAULT_TIMEOUT_MS,
                max_rows: limits::DEFAULT_MAX_ROWS,
            },
            sql_excerpt_len: guard::SQL_EXCERPT_MAX_CHARS,
        }
    }
}

impl GateConfig {
    /// Build configuration from environment variables, falling back to
    /// the defaults in [`crate::constants`].
    #[must_use]
    pub fn from_env() -> Self {
        let cache_config = CacheConfig {
            max_entries: env_parse("CACHE_MAX_ENTRIES", cache::DEFAULT_CACHE_MAX_ENTRIES),
            cleanup_interval: Duration::from_secs(env_parse(
                "CACHE_CLEANUP_INTERVAL_SECS",
                cache::DEFAULT_CLEANUP_INTERVAL_SECS,
            )),
            default_ttl: Duration::from_secs(env_parse(
                "CACHE_RESULT_TTL_SECS",
                cache::DEFAULT_RESULT_TTL_SECS,
            )),
            enable_background_cleanup: true,
        };

        Self {
            cache: cache_config,
            default_limits: ExecutionLimits {
                timeout_ms: env_parse("QUERY_TIMEOUT_MS", limits::DEFAULT_TIMEOUT_MS),
                max_rows: env_parse("QUERY_MAX_ROWS", limits::DEFAULT_MAX_ROWS),
            },
            sql_excerpt_len: env_parse("SQL_EXCERPT_MAX_CHARS", guard::SQL_EXCERPT_MAX_CHARS),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
