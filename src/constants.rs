// ABOUTME: System-wide constants and configuration defaults for the query gate
// ABOUTME: Environment variables override the hardcoded defaults via config::GateConfig
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Hardcoded defaults for the gate. Everything here can be overridden
//! through the environment via [`crate::config::GateConfig::from_env`].

/// Result-cache defaults
pub mod cache {
    /// Maximum cached results before LRU displacement
    pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 5000;

    /// Seconds between expired-entry sweeps
    pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

    /// Default result TTL (15 minutes; analytic sources change slowly)
    pub const DEFAULT_RESULT_TTL_SECS: u64 = 900;
}

/// Guard defaults
pub mod guard {
    /// Maximum characters of SQL logged when an internal failure is
    /// downgraded to `UNKNOWN_ERROR` (parameter values are never logged)
    pub const SQL_EXCERPT_MAX_CHARS: usize = 120;
}

/// Execution-limit defaults forwarded to the execution collaborator
pub mod limits {
    /// Default statement timeout in milliseconds
    pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

    /// Default maximum rows returned to the renderer
    pub const DEFAULT_MAX_ROWS: u64 = 10_000;
}

/// Service identity for structured logging
pub mod service {
    /// Service name attached to log records
    pub const SERVICE_NAME: &str = "query-gate";

    /// Crate version from Cargo.toml
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
}
