// ABOUTME: Dialect-aware parameter binder rewriting ${name} sites into engine placeholder syntax
// ABOUTME: One logical slot per distinct name; positional dialects repeat values to stay aligned
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Parameter Binder
//!
//! Rewrites guard-accepted SQL into the target engine's placeholder syntax
//! and produces the ordered value list the execution collaborator passes to
//! its driver. Placeholder names absent from the parameter map are left as
//! literal `${name}` text (preserved source behavior; a warning is logged
//! because unresolved placeholders in executable SQL are a latent risk).

use crate::scanner;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Target engine placeholder convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `$1`, `$2`, ... ordinals
    Postgres,
    /// `$1`, `$2`, ... ordinals
    Snowflake,
    /// `@p1`, `@p2`, ... ordinals
    Mssql,
    /// `?` positional
    Mysql,
    /// `?` positional
    Sqlite,
    /// `?` positional
    Clickhouse,
}

impl Dialect {
    /// Whether this dialect uses ordinal placeholders (one per distinct
    /// name) rather than positional `?`.
    #[must_use]
    pub const fn is_ordinal(self) -> bool {
        matches!(self, Self::Postgres | Self::Snowflake | Self::Mssql)
    }

    fn ordinal_placeholder(self, n: usize) -> String {
        match self {
            Self::Postgres | Self::Snowflake => format!("${n}"),
            Self::Mssql => format!("@p{n}"),
            Self::Mysql | Self::Sqlite | Self::Clickhouse => "?".to_owned(),
        }
    }

    /// Wire identifier used by panel configs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Snowflake => "snowflake",
            Self::Mssql => "mssql",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
            Self::Clickhouse => "clickhouse",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "snowflake" => Ok(Self::Snowflake),
            "mssql" | "sqlserver" => Ok(Self::Mssql),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "sqlite" => Ok(Self::Sqlite),
            "clickhouse" => Ok(Self::Clickhouse),
            other => Err(format!("unknown dialect: {other}")),
        }
    }
}

/// Binder output: rewritten SQL plus the driver-ready value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundQuery {
    /// SQL with `${name}` sites rewritten to dialect placeholders
    pub sql: String,
    /// Values in the order the engine consumes them
    pub values: Vec<Value>,
    /// Distinct placeholder names in slot-assignment order
    pub param_order: Vec<String>,
}

/// Rewrite `sql` for the given dialect, binding values from `params`.
///
/// Each distinct placeholder name with a value present consumes exactly one
/// logical slot, assigned in first-textual-occurrence order. Ordinal
/// dialects reuse the slot's placeholder at every occurrence and append the
/// value once; positional dialects emit one `?` per occurrence and repeat
/// the value so placeholder order and value order never desynchronize.
#[must_use]
pub fn bind(sql: &str, params: &Map<String, Value>, dialect: Dialect) -> BoundQuery {
    let sites = scanner::scan_placeholders(sql);

    // Slot assignment: distinct bound names in first-occurrence order
    let mut param_order: Vec<String> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut unresolved: Vec<String> = Vec::new();
    for site in &sites {
        if params.contains_key(&site.name) {
            if !slots.contains_key(site.name.as_str()) {
                slots.insert(site.name.as_str(), param_order.len() + 1);
                param_order.push(site.name.clone());
            }
        } else if !unresolved.contains(&site.name) {
            unresolved.push(site.name.clone());
        }
    }

    if !unresolved.is_empty() {
        tracing::warn!(
            placeholders = ?unresolved,
            "placeholders left unbound; literal ${{name}} text passes through to execution"
        );
    }

    let mut rewritten = String::with_capacity(sql.len());
    let mut values: Vec<Value> = Vec::new();
    if dialect.is_ordinal() {
        for name in &param_order {
            // Present by construction of param_order
            if let Some(value) = params.get(name) {
                values.push(value.clone());
            }
        }
    }

    let mut cursor = 0;
    for site in &sites {
        rewritten.push_str(&sql[cursor..site.start]);
        cursor = site.end;
        match slots.get(site.name.as_str()) {
            Some(&ordinal) => {
                rewritten.push_str(&dialect.ordinal_placeholder(ordinal));
                if !dialect.is_ordinal() {
                    if let Some(value) = params.get(&site.name) {
                        values.push(value.clone());
                    }
                }
            }
            // Unbound name: leave the literal ${name} text in place
            None => rewritten.push_str(&sql[site.start..site.end]),
        }
    }
    rewritten.push_str(&sql[cursor..]);

    BoundQuery {
        sql: rewritten,
        values,
        param_order,
    }
}
