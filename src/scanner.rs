// ABOUTME: Quote-aware scanner over SQL text for ${name} bind-parameter placeholders
// ABOUTME: Explicit 3-state machine (unquoted / single-quoted / double-quoted), linear time
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Placeholder Scanner
//!
//! Locates `${name}` placeholders that occur outside single- or
//! double-quoted string literals. A backslash consumes the following
//! character without toggling quote state; a single quote is inert inside a
//! double-quoted span and vice versa. Malformed placeholder syntax (missing
//! `}`, invalid leading character) is left as literal text and is not
//! reported.
//!
//! The scanner also provides the quote-state primitives the guard builds
//! on: masking string-literal contents and detecting unquoted characters.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Quote state of the scanner at a given position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    /// Outside any string literal
    Unquoted,
    /// Inside a `'...'` span
    Single,
    /// Inside a `"..."` span
    Double,
}

/// A placeholder occurrence in the SQL text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSite {
    /// Parameter name between the braces
    pub name: String,
    /// Byte offset of the `$` that opens the site
    pub start: usize,
    /// Byte offset one past the closing `}`
    pub end: usize,
}

/// Scan for all unquoted `${name}` sites in textual order, duplicates kept.
#[must_use]
pub fn scan_placeholders(sql: &str) -> Vec<PlaceholderSite> {
    let bytes = sql.as_bytes();
    let mut sites = Vec::new();
    let mut state = QuoteState::Unquoted;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                // Escape consumes the next character regardless of state
                i += 2;
                continue;
            }
            b'\'' => {
                state = match state {
                    QuoteState::Unquoted => QuoteState::Single,
                    QuoteState::Single => QuoteState::Unquoted,
                    QuoteState::Double => QuoteState::Double,
                };
            }
            b'"' => {
                state = match state {
                    QuoteState::Unquoted => QuoteState::Double,
                    QuoteState::Double => QuoteState::Unquoted,
                    QuoteState::Single => QuoteState::Single,
                };
            }
            b'$' if state == QuoteState::Unquoted => {
                if let Some(site) = try_placeholder(sql, i) {
                    i = site.end;
                    sites.push(site);
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }

    sites
}

/// Attempt to read `${name}` starting at byte offset `start` (at the `$`).
fn try_placeholder(sql: &str, start: usize) -> Option<PlaceholderSite> {
    let bytes = sql.as_bytes();
    if bytes.get(start + 1) != Some(&b'{') {
        return None;
    }
    let first = *bytes.get(start + 2)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let mut end = start + 3;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    if bytes.get(end) != Some(&b'}') {
        return None;
    }
    Some(PlaceholderSite {
        name: sql[start + 2..end].to_owned(),
        start,
        end: end + 1,
    })
}

/// Placeholder names in first-occurrence order with duplicates removed.
///
/// This is the binder's call mode: the order defines ordinal slot
/// assignment.
#[must_use]
pub fn placeholder_names(sql: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for site in scan_placeholders(sql) {
        if seen.insert(site.name.clone()) {
            names.push(site.name);
        }
    }
    names
}

/// Unordered de-duplicated set of placeholder names.
#[must_use]
pub fn placeholder_name_set(sql: &str) -> HashSet<String> {
    scan_placeholders(sql).into_iter().map(|s| s.name).collect()
}

/// Subset of `params` actually referenced by the SQL text.
///
/// Used by call sites that audit or log bound parameters: values for names
/// the statement never mentions are dropped.
#[must_use]
pub fn filter_to_used(sql: &str, params: &Map<String, Value>) -> Map<String, Value> {
    let used = placeholder_name_set(sql);
    params
        .iter()
        .filter(|(k, _)| used.contains(k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Replace every character inside a string literal with a space, keeping
/// the enclosing quotes.
///
/// Lexical checks (locking clauses, blocklisted names, write keywords) run
/// on the masked text so that literal contents can never trigger them.
#[must_use]
pub fn mask_string_literals(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut state = QuoteState::Unquoted;
    let mut chars = sql.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if state == QuoteState::Unquoted {
                    out.push(c);
                } else {
                    out.push(' ');
                }
                if let Some(next) = chars.next() {
                    if state == QuoteState::Unquoted {
                        out.push(next);
                    } else {
                        out.push(' ');
                    }
                }
            }
            '\'' => {
                state = match state {
                    QuoteState::Unquoted => {
                        out.push(c);
                        QuoteState::Single
                    }
                    QuoteState::Single => {
                        out.push(c);
                        QuoteState::Unquoted
                    }
                    QuoteState::Double => {
                        out.push(' ');
                        QuoteState::Double
                    }
                };
            }
            '"' => {
                state = match state {
                    QuoteState::Unquoted => {
                        out.push(c);
                        QuoteState::Double
                    }
                    QuoteState::Double => {
                        out.push(c);
                        QuoteState::Unquoted
                    }
                    QuoteState::Single => {
                        out.push(' ');
                        QuoteState::Single
                    }
                };
            }
            _ => {
                if state == QuoteState::Unquoted {
                    out.push(c);
                } else {
                    out.push(' ');
                }
            }
        }
    }

    out
}

/// Whether `target` occurs outside string literals.
#[must_use]
pub fn has_unquoted(sql: &str, target: char) -> bool {
    let mut state = QuoteState::Unquoted;
    let mut chars = sql.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '\'' => {
                state = match state {
                    QuoteState::Unquoted => QuoteState::Single,
                    QuoteState::Single => QuoteState::Unquoted,
                    QuoteState::Double => QuoteState::Double,
                };
            }
            '"' => {
                state = match state {
                    QuoteState::Unquoted => QuoteState::Double,
                    QuoteState::Double => QuoteState::Unquoted,
                    QuoteState::Single => QuoteState::Single,
                };
            }
            c if c == target && state == QuoteState::Unquoted => return true,
            _ => {}
        }
    }
    false
}
