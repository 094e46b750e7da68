// ABOUTME: Statement validator standing between user-authored SQL and per-tenant execution
// ABOUTME: Terminal structural checks, then accumulated lexical and AST checks
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Statement Guard
//!
//! Decides whether a user-authored analytic statement may run. Only a
//! single read-only `SELECT`-shaped statement passes: a top-level
//! `SELECT`, a parenthesized `SELECT`, or a `WITH` clause whose bodies
//! resolve to `SELECT`.
//!
//! The pipeline normalizes first (comments stripped, whitespace collapsed,
//! one trailing `;` dropped), applies terminal structural checks (empty,
//! multi-statement, non-`SELECT` prefix, `SELECT INTO`, locking clause),
//! then accumulates every lexical and structural violation (blocklisted
//! functions, write keywords after `WITH`, write-class AST nodes, parse
//! failures) before rejecting.
//!
//! The guard is an immutable value: construct once, share across request
//! handlers. All pattern tables are compiled once at first use.

/// Structural AST walk for write-class operations
pub mod ast_walk;
/// Blocklisted function and write-keyword tables
pub mod blocklist;
/// Structural parse stage with dialect fallback
pub mod patterns;
/// Dummy-literal substitution for template validation
pub mod template;

use crate::config::GateConfig;
use crate::constants::guard::SQL_EXCERPT_MAX_CHARS;
use crate::errors::{GateError, GateResult, IssueCode, ValidationIssue, ValidationResult};
use crate::scanner;
use patterns::ParseOutcome;
use regex::Regex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::LazyLock;

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // compile-time constant pattern
    Regex::new(r"(?i)^\s*(?:\(\s*select\b|select\b|with\b)").unwrap()
});

static SELECT_INTO_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // compile-time constant pattern
    Regex::new(r"(?i)\binto\b").unwrap()
});

static LOCKING_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // compile-time constant pattern
    Regex::new(r"(?i)\bfor\s+(?:update|no\s+key\s+update|share|key\s+share)\b").unwrap()
});

static WITH_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // compile-time constant pattern
    Regex::new(r"(?i)\bwith\b").unwrap()
});

/// Immutable statement validator, shareable across concurrent callers.
#[derive(Debug, Clone)]
pub struct Guard {
    /// Maximum characters of SQL logged on internal failure
    excerpt_len: usize,
}

impl Default for Guard {
    fn default() -> Self {
        Self {
            excerpt_len: SQL_EXCERPT_MAX_CHARS,
        }
    }
}

impl Guard {
    /// Build a guard from gate configuration.
    #[must_use]
    pub const fn with_config(config: &GateConfig) -> Self {
        Self {
            excerpt_len: config.sql_excerpt_len,
        }
    }

    /// Non-throwing validation: always returns a report.
    #[must_use]
    pub fn validate(&self, sql: &str) -> ValidationResult {
        match self.run_pipeline(sql) {
            Ok(()) => ValidationResult::ok(),
            Err(err) => err.into(),
        }
    }

    /// Error-form validation: `Ok(())` when the statement may run.
    ///
    /// # Errors
    ///
    /// Returns a [`GateError`] carrying every accumulated issue.
    pub fn assert_safe(&self, sql: &str) -> GateResult<()> {
        self.run_pipeline(sql)
    }

    /// Validate an unbound SQL template by substituting type-plausible
    /// dummy literals for every `${name}` placeholder first.
    #[must_use]
    pub fn validate_template(&self, sql: &str) -> ValidationResult {
        self.validate(&template::substitute_dummies(sql))
    }

    /// Run the pipeline, downgrading any internal failure to
    /// `UNKNOWN_ERROR` with a sanitized log entry. Never panics the
    /// request handler and never exposes parameter values.
    fn run_pipeline(&self, sql: &str) -> GateResult<()> {
        match catch_unwind(AssertUnwindSafe(|| pipeline(sql))) {
            Ok(result) => result,
            Err(_) => {
                let excerpt: String = sql.chars().take(self.excerpt_len).collect();
                tracing::error!(sql_excerpt = %excerpt, "internal failure while validating SQL");
                Err(GateError::single(
                    IssueCode::UnknownError,
                    "internal error while validating query",
                ))
            }
        }
    }
}

/// Strip comments, collapse whitespace outside string literals, and drop
/// one trailing statement terminator.
#[must_use]
pub fn normalize(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(c) = chars.next() {
        if in_single || in_double {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                '\'' if in_single => in_single = false,
                '"' if in_double => in_double = false,
                _ => {}
            }
            continue;
        }
        match c {
            '\'' => {
                in_single = true;
                out.push(c);
            }
            '"' => {
                in_double = true;
                out.push(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                // Line comment: discard to end of line
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
                push_space(&mut out);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut depth = 1_u32;
                while depth > 0 {
                    match chars.next() {
                        Some('*') if chars.peek() == Some(&'/') => {
                            chars.next();
                            depth -= 1;
                        }
                        Some('/') if chars.peek() == Some(&'*') => {
                            chars.next();
                            depth += 1;
                        }
                        Some(_) => {}
                        None => break,
                    }
                }
                push_space(&mut out);
            }
            c if c.is_whitespace() => push_space(&mut out),
            _ => out.push(c),
        }
    }

    let mut trimmed = out.trim().to_owned();
    if trimmed.ends_with(';') {
        trimmed.pop();
        trimmed.truncate(trimmed.trim_end().len());
    }
    trimmed
}

fn push_space(out: &mut String) {
    if !out.ends_with(' ') && !out.is_empty() {
        out.push(' ');
    }
}

fn pipeline(sql: &str) -> GateResult<()> {
    let normalized = normalize(sql);

    // Terminal checks: first match ends validation with exactly one issue
    if normalized.is_empty() {
        return Err(GateError::single(
            IssueCode::EmptyQuery,
            "query is empty after normalization",
        ));
    }
    if scanner::has_unquoted(&normalized, ';') {
        return Err(GateError::single(
            IssueCode::MultiStatement,
            "only a single statement may be submitted",
        ));
    }

    let masked = scanner::mask_string_literals(&normalized);

    if !PREFIX_RE.is_match(&normalized) {
        return Err(GateError::single(
            IssueCode::NotSelect,
            "only SELECT statements are permitted",
        ));
    }
    if SELECT_INTO_RE.is_match(&masked) {
        // INTO TEMP included: a temp table is still a write side effect
        return Err(GateError::single(
            IssueCode::SelectInto,
            "SELECT INTO creates a table and is not permitted",
        ));
    }
    if LOCKING_RE.is_match(&masked) {
        return Err(GateError::single(
            IssueCode::Locking,
            "locking clauses (FOR UPDATE / FOR SHARE) are not permitted",
        ));
    }

    // Accumulating checks: collect every violation before failing
    let mut issues = Vec::new();

    for name in blocklist::find_blocked_functions(&masked) {
        issues.push(ValidationIssue::new(
            IssueCode::BlockedFunc,
            format!("blocked function: {name}"),
        ));
    }

    if let Some(with_match) = WITH_RE.find(&masked) {
        if let Some(keyword) = blocklist::find_write_keyword(&masked[with_match.end()..]) {
            issues.push(ValidationIssue::new(
                IssueCode::NonSelectCte,
                format!("write operation {keyword} inside WITH clause"),
            ));
        }
    }

    match patterns::structural_parse(&normalized, sql) {
        ParseOutcome::Parsed(statements) => {
            ast_walk::collect_dangerous_operations(&statements, &mut issues);
        }
        ParseOutcome::DialectFallbackAccepted => {}
        ParseOutcome::Rejected(message) => {
            issues.push(ValidationIssue::new(
                IssueCode::ParseError,
                format!("could not parse query: {message}"),
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(GateError::new(issues))
    }
}
