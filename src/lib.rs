// ABOUTME: Library entry point for the SQL safety gate and parameter-binding pipeline
// ABOUTME: Guard, scanner, binder, and result-cache key derivation for analytic queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Query Gate
//!
//! The component that stands between end-user-authored analytic SQL and
//! execution against live, per-tenant external databases:
//!
//! - **Guard**: an allow-list statement validator guaranteeing only
//!   read-only `SELECT`-shaped queries reach execution
//! - **Scanner**: a quote-aware tokenizer locating `${name}` bind sites
//! - **Binder**: a dialect-aware rewriter producing driver-ready SQL and
//!   an ordered value list
//! - **Cache key builder**: a deterministic digest over the canonicalized
//!   request, used by a thin TTL result cache wrapping execution
//!
//! The gate never executes SQL and never owns connections; it decides
//! "may this statement run" and "how do these parameters bind".
//!
//! ## Example
//!
//! ```rust
//! use query_gate::binder::{bind, Dialect};
//! use query_gate::guard::Guard;
//! use serde_json::{json, Map};
//!
//! let guard = Guard::default();
//! let sql = "SELECT name FROM devices WHERE tenant = ${tenant_id}";
//!
//! let report = guard.validate_template(sql);
//! assert!(report.valid);
//!
//! let mut params = Map::new();
//! params.insert("tenant_id".to_owned(), json!(42));
//! let bound = bind(sql, &params, Dialect::Postgres);
//! assert_eq!(bound.sql, "SELECT name FROM devices WHERE tenant = $1");
//! ```

/// Dialect-aware parameter binder
pub mod binder;

/// Result cache: key derivation and TTL store
pub mod cache;

/// Environment-based gate configuration
pub mod config;

/// System-wide constants and defaults
pub mod constants;

/// Issue taxonomy and error types
pub mod errors;

/// Statement validator
pub mod guard;

/// Structured logging setup
pub mod logging;

/// Quote-aware placeholder scanner
pub mod scanner;

pub use binder::{bind, BoundQuery, Dialect};
pub use cache::memory::InMemoryResultCache;
pub use cache::{CacheConfig, ExecutionLimits, Pagination, QueryCacheKey, ResultCache};
pub use config::GateConfig;
pub use errors::{GateError, GateResult, IssueCode, ValidationIssue, ValidationResult};
pub use guard::Guard;
