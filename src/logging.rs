// ABOUTME: Structured logging setup for the query gate
// ABOUTME: EnvFilter-driven levels with pretty or JSON output
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Logging initialization. The gate itself only emits `tracing` events;
//! the embedding server calls [`init_logging`] once at startup.

use crate::constants::service;
use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for development
    Pretty,
    /// One JSON object per line for log aggregation
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Level comes from `RUST_LOG` (default `info`), format from `LOG_FORMAT`
/// (`pretty` or `json`). Calling twice is a no-op error from the
/// subscriber registry, which is ignored so tests can call this freely.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match LogFormat::from_env() {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().compact()).try_init(),
    };

    if result.is_ok() {
        tracing::info!(
            service = service::SERVICE_NAME,
            version = service::SERVICE_VERSION,
            "logging initialized"
        );
    }
}
