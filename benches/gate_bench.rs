// ABOUTME: Criterion benchmarks for the validation pipeline, binder, and key derivation
// ABOUTME: Measures per-query latency for simple and complex statements
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Criterion benchmarks for the query gate hot path.
//!
//! Every dashboard panel refresh runs validate + bind + key build before
//! any cache lookup, so these three dominate gate overhead.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    missing_docs
)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use query_gate::binder::{bind, Dialect};
use query_gate::cache::QueryCacheKey;
use query_gate::guard::Guard;
use serde_json::{json, Map, Value};

const SIMPLE_SQL: &str = "SELECT name, last_seen FROM devices WHERE tenant = ${tenant_id}";

const COMPLEX_SQL: &str = "
    WITH device_stats AS (
        SELECT device_id, COUNT(*) AS reading_count, MAX(ts) AS last_reading
        FROM readings
        WHERE ts >= ${window_start} AND ts < ${window_end}
        GROUP BY device_id
    )
    SELECT d.name, ds.reading_count, ds.last_reading
    FROM devices d
    INNER JOIN device_stats ds ON d.id = ds.device_id
    WHERE d.tenant = ${tenant_id}
      AND d.id IN (SELECT device_id FROM subscriptions WHERE status = ${status})
    ORDER BY ds.reading_count DESC
    LIMIT 500
";

fn bench_params() -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("tenant_id".to_owned(), json!(42));
    params.insert("window_start".to_owned(), json!("2024-01-01T00:00:00Z"));
    params.insert("window_end".to_owned(), json!("2024-02-01T00:00:00Z"));
    params.insert("status".to_owned(), json!("active"));
    params
}

fn bench_validate(c: &mut Criterion) {
    let guard = Guard::default();
    let mut group = c.benchmark_group("guard_validate");

    for (name, sql) in [("simple", SIMPLE_SQL), ("complex", COMPLEX_SQL)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &sql, |b, sql| {
            b.iter(|| guard.validate_template(black_box(sql)));
        });
    }

    group.bench_function("rejected_multi_statement", |b| {
        b.iter(|| guard.validate(black_box("SELECT 1; DROP TABLE users")));
    });

    group.finish();
}

fn bench_bind(c: &mut Criterion) {
    let params = bench_params();
    let mut group = c.benchmark_group("binder");

    for dialect in [Dialect::Postgres, Dialect::Mysql, Dialect::Mssql] {
        group.bench_with_input(
            BenchmarkId::from_parameter(dialect.as_str()),
            &dialect,
            |b, &dialect| {
                b.iter(|| bind(black_box(COMPLEX_SQL), &params, dialect));
            },
        );
    }

    group.finish();
}

fn bench_cache_key(c: &mut Criterion) {
    let params = bench_params();

    c.bench_function("cache_key_build", |b| {
        b.iter(|| {
            QueryCacheKey::build(
                black_box(COMPLEX_SQL),
                &params,
                Some("user-123"),
                Some("tsdb-eu-1"),
                None,
                None,
            )
        });
    });
}

criterion_group!(benches, bench_validate, bench_bind, bench_cache_key);
criterion_main!(benches);
