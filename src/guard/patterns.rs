// ABOUTME: Structural parse stage with dialect-extension fallback for the guard
// ABOUTME: Tagged ParseOutcome instead of nested error control flow
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use regex::Regex;
use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::sync::LazyLock;

/// Outcome of the structural parse stage.
#[derive(Debug)]
pub enum ParseOutcome {
    /// Generic grammar accepted the statement; the tree is ready to walk
    Parsed(Vec<Statement>),
    /// Generic grammar failed but the text uses a known dialect extension,
    /// so the failure is treated as a benign grammar gap
    DialectFallbackAccepted,
    /// Generic grammar failed and no extension pattern matched
    Rejected(String),
}

/// Postgres dialect extensions the generic grammar is known to trip over.
///
/// A parse failure on text matching any of these is suppressed rather than
/// reported, since the statement is expected to be valid on the target
/// engine. The table is fixed and compiled once.
static DIALECT_EXTENSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // interval arithmetic: now() - interval '30 days'
        r"(?i)\binterval\s+'[^']*'",
        // :: type casts
        r"::\s*[A-Za-z_][A-Za-z0-9_]*",
        // case-insensitive / regex-style matching
        r"(?i)\bilike\b",
        r"(?i)\bsimilar\s+to\b",
        // DISTINCT ON (...)
        r"(?i)\bdistinct\s+on\s*\(",
        // window functions
        r"(?i)\bover\s*\(",
        // NULLS FIRST / NULLS LAST ordering
        r"(?i)\bnulls\s+(first|last)\b",
        // database.schema.table qualification
        r"\b\w+\.\w+\.\w+\b",
        // array / range containment and overlap operators
        r"@>|<@|&&",
        // JSON navigation operators
        r"->>|->|#>>|#>",
        // JSON key-existence operators
        r"\?\||\?&",
    ]
    .iter()
    .map(|p| {
        #[allow(clippy::unwrap_used)] // patterns are compile-time constants
        Regex::new(p).unwrap()
    })
    .collect()
});

/// Parse the normalized statement with the generic grammar; on failure,
/// consult the dialect-extension table against the original text.
#[must_use]
pub fn structural_parse(normalized: &str, original: &str) -> ParseOutcome {
    match Parser::parse_sql(&GenericDialect {}, normalized) {
        Ok(statements) => ParseOutcome::Parsed(statements),
        Err(err) => {
            if DIALECT_EXTENSION_PATTERNS
                .iter()
                .any(|re| re.is_match(original))
            {
                ParseOutcome::DialectFallbackAccepted
            } else {
                ParseOutcome::Rejected(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_select_parses() {
        assert!(matches!(
            structural_parse("SELECT 1", "SELECT 1"),
            ParseOutcome::Parsed(_)
        ));
    }

    #[test]
    fn garbage_is_rejected_with_parser_message() {
        match structural_parse("SELECT FROM FROM", "SELECT FROM FROM") {
            ParseOutcome::Rejected(msg) => assert!(!msg.is_empty()),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn cast_pattern_suppresses_parse_failure() {
        // Even if the generic grammar rejected this text, the ::date cast
        // marks it as a dialect extension
        let sql = "SELECT id FROM t WHERE d = '2024-01-01'::date";
        match structural_parse(sql, sql) {
            ParseOutcome::Parsed(_) | ParseOutcome::DialectFallbackAccepted => {}
            ParseOutcome::Rejected(msg) => panic!("unexpected rejection: {msg}"),
        }
    }
}
