// ABOUTME: Integration tests for the quote-aware placeholder scanner
// ABOUTME: Covers literal masking, escape handling, and parameter pruning
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use query_gate::scanner::{
    filter_to_used, mask_string_literals, placeholder_names, scan_placeholders,
};
use serde_json::{json, Map};

#[test]
fn finds_placeholders_in_order_of_appearance() {
    let sql = "SELECT * FROM t WHERE a = ${first} AND b = ${second} AND c = ${first}";
    let names = placeholder_names(sql);
    assert_eq!(names, vec!["first", "second"]);
}

#[test]
fn placeholder_inside_single_quotes_is_text() {
    let sql = "SELECT '${not_a_param}' FROM t WHERE a = ${real}";
    let sites = scan_placeholders(sql);
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].name, "real");
}

#[test]
fn placeholder_inside_double_quotes_is_text() {
    let sql = r#"SELECT "${col}" FROM t WHERE a = ${real}"#;
    assert_eq!(placeholder_names(sql), vec!["real"]);
}

#[test]
fn backslash_escape_does_not_terminate_literal() {
    // The \' keeps the literal open, so the placeholder is inside it
    let sql = r"SELECT 'it\'s ${still_text}' FROM t";
    assert!(scan_placeholders(sql).is_empty());
}

#[test]
fn quote_of_the_other_kind_is_inert_inside_a_literal() {
    let sql = r#"SELECT 'he said "${x}"' FROM t WHERE a = ${y}"#;
    assert_eq!(placeholder_names(sql), vec!["y"]);
}

#[test]
fn malformed_placeholders_are_ignored() {
    assert!(scan_placeholders("SELECT ${} FROM t").is_empty());
    assert!(scan_placeholders("SELECT ${1abc} FROM t").is_empty());
    assert!(scan_placeholders("SELECT ${no space} FROM t").is_empty());
    assert!(scan_placeholders("SELECT ${unterminated FROM t").is_empty());
}

#[test]
fn sites_carry_byte_spans_over_the_full_token() {
    let sql = "WHERE a = ${name}";
    let sites = scan_placeholders(sql);
    assert_eq!(&sql[sites[0].start..sites[0].end], "${name}");
}

#[test]
fn masking_blanks_literal_interiors_but_keeps_structure() {
    let sql = "SELECT 'drop table x' FROM t WHERE a = 'b'";
    let masked = mask_string_literals(sql);
    assert_eq!(masked.len(), sql.len());
    assert!(!masked.contains("drop table"));
    assert!(masked.contains("SELECT '"));
    assert!(masked.contains("FROM t WHERE a = '"));
}

#[test]
fn filter_to_used_prunes_unreferenced_parameters() {
    let sql = "SELECT * FROM t WHERE a = ${a}";
    let mut params = Map::new();
    params.insert("a".to_owned(), json!(1));
    params.insert("stale".to_owned(), json!("leftover"));

    let used = filter_to_used(sql, &params);
    assert_eq!(used.len(), 1);
    assert!(used.contains_key("a"));
}
