// ABOUTME: Fixed blocklist of SQL functions disallowed in user-authored analytic queries
// ABOUTME: Word-boundary matcher over quote-masked text, one issue per distinct match
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use regex::Regex;
use std::sync::LazyLock;

/// Function names that must never appear as an invocation in accepted SQL.
///
/// Grouped by the risk they carry: server control and signalling, file and
/// large-object I/O, remote execution via dblink, advisory locking (denial
/// of service), privilege introspection, and session/server introspection.
/// `dblink` is matched as a prefix to cover the whole `dblink_*` family.
pub const BLOCKED_FUNCTIONS: &[&str] = &[
    // Sleep / server control
    "pg_sleep",
    "pg_sleep_for",
    "pg_sleep_until",
    "pg_terminate_backend",
    "pg_cancel_backend",
    "pg_reload_conf",
    "pg_rotate_logfile",
    "set_config",
    // File and large-object I/O
    "pg_read_file",
    "pg_read_binary_file",
    "pg_stat_file",
    "pg_ls_dir",
    "pg_ls_logdir",
    "pg_ls_waldir",
    "lo_import",
    "lo_export",
    // Advisory locks
    "pg_advisory_lock",
    "pg_advisory_lock_shared",
    "pg_advisory_xact_lock",
    "pg_try_advisory_lock",
    // Privilege introspection
    "has_table_privilege",
    "has_database_privilege",
    "has_schema_privilege",
    "has_function_privilege",
    "has_column_privilege",
    "pg_has_role",
    // Session / server introspection
    "current_user",
    "session_user",
    "current_database",
    "current_schema",
    "current_schemas",
    "version",
    "inet_server_addr",
    "inet_client_addr",
    "pg_backend_pid",
];

static BLOCKLIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut alternation = BLOCKED_FUNCTIONS
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    // dblink_* family matched as a prefix
    alternation.push_str("|dblink\\w*");
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant alternation
    Regex::new(&format!(r"(?i)\b({alternation})\b")).unwrap()
});

/// Find blocklisted function names in quote-masked SQL text.
///
/// Returns each matched name once, lowercased, in first-occurrence order.
/// The caller is responsible for masking string literals first so that a
/// bare occurrence inside a literal does not count.
#[must_use]
pub fn find_blocked_functions(masked_sql: &str) -> Vec<String> {
    let mut found = Vec::new();
    for m in BLOCKLIST_RE.find_iter(masked_sql) {
        let name = m.as_str().to_ascii_lowercase();
        if !found.contains(&name) {
            found.push(name);
        }
    }
    found
}

/// Write-class keywords that must not appear as statement-level operations
/// or CTE bodies in accepted SQL.
pub const WRITE_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "TRUNCATE", "GRANT", "REVOKE",
    "COPY", "EXECUTE", "CALL", "MERGE", "UPSERT", "REPLACE",
];

static WRITE_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = WRITE_KEYWORDS.join("|");
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant alternation
    Regex::new(&format!(r"(?i)\b({alternation})\b")).unwrap()
});

/// First write-class keyword in the given masked text, if any.
#[must_use]
pub fn find_write_keyword(masked_sql: &str) -> Option<String> {
    WRITE_KEYWORD_RE
        .find(masked_sql)
        .map(|m| m.as_str().to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_call_sites_case_insensitively() {
        assert_eq!(
            find_blocked_functions("SELECT PG_SLEEP(1)"),
            vec!["pg_sleep".to_owned()]
        );
    }

    #[test]
    fn dblink_family_matched_by_prefix() {
        assert_eq!(
            find_blocked_functions("SELECT dblink_exec('conn', 'x')"),
            vec!["dblink_exec".to_owned()]
        );
    }

    #[test]
    fn substring_of_longer_identifier_does_not_match() {
        assert!(find_blocked_functions("SELECT my_version_column FROM t").is_empty());
    }

    #[test]
    fn schema_introspection_matches_both_variants() {
        assert_eq!(
            find_blocked_functions("SELECT current_schema()"),
            vec!["current_schema".to_owned()]
        );
        assert_eq!(
            find_blocked_functions("SELECT current_schemas(true)"),
            vec!["current_schemas".to_owned()]
        );
    }

    #[test]
    fn reports_each_name_once() {
        assert_eq!(
            find_blocked_functions("SELECT pg_sleep(1), pg_sleep(2), version()"),
            vec!["pg_sleep".to_owned(), "version".to_owned()]
        );
    }

    #[test]
    fn write_keyword_scan_finds_first_match() {
        assert_eq!(
            find_write_keyword("WITH x AS (delete FROM t) SELECT 1"),
            Some("DELETE".to_owned())
        );
        assert_eq!(find_write_keyword("SELECT a FROM t"), None);
    }
}
