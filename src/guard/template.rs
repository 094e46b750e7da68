// ABOUTME: Dummy-literal substitution so unbound SQL templates can be validated structurally
// ABOUTME: Picks a type-plausible literal per placeholder name before running the normal pipeline
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::scanner;

/// Pick a dummy literal that is plausible for the placeholder name, so the
/// substituted template still parses the way the bound query would.
#[must_use]
pub fn dummy_literal(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if looks_temporal(&lower) {
        "'2024-01-01 00:00:00'"
    } else if looks_numeric(&lower) {
        "1"
    } else {
        "'placeholder'"
    }
}

fn looks_temporal(name: &str) -> bool {
    ["date", "time", "timestamp", "day", "month", "year", "from", "to", "since", "until"]
        .iter()
        .any(|hint| name.contains(hint))
}

fn looks_numeric(name: &str) -> bool {
    ["id", "count", "limit", "offset", "num", "size", "page", "qty"]
        .iter()
        .any(|hint| name.contains(hint))
}

/// Replace every unquoted `${name}` site with its dummy literal.
#[must_use]
pub fn substitute_dummies(sql: &str) -> String {
    let sites = scanner::scan_placeholders(sql);
    let mut out = String::with_capacity(sql.len());
    let mut cursor = 0;
    for site in sites {
        out.push_str(&sql[cursor..site.start]);
        out.push_str(dummy_literal(&site.name));
        cursor = site.end;
    }
    out.push_str(&sql[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporal_names_get_timestamp_literals() {
        assert_eq!(dummy_literal("start_date"), "'2024-01-01 00:00:00'");
        assert_eq!(dummy_literal("fromTime"), "'2024-01-01 00:00:00'");
    }

    #[test]
    fn id_like_names_get_integers() {
        assert_eq!(dummy_literal("device_id"), "1");
        assert_eq!(dummy_literal("row_count"), "1");
    }

    #[test]
    fn other_names_get_quoted_strings() {
        assert_eq!(dummy_literal("label"), "'placeholder'");
    }

    #[test]
    fn substitution_preserves_surrounding_text() {
        let sql = "SELECT * FROM t WHERE id = ${device_id} AND name = ${label}";
        assert_eq!(
            substitute_dummies(sql),
            "SELECT * FROM t WHERE id = 1 AND name = 'placeholder'"
        );
    }

    #[test]
    fn quoted_placeholders_are_untouched() {
        let sql = "SELECT '${device_id}' FROM t";
        assert_eq!(substitute_dummies(sql), sql);
    }
}
