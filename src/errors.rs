// ABOUTME: Closed issue-code taxonomy and error types for the SQL safety gate
// ABOUTME: Defines validation issues, the non-throwing result form, and HTTP response formatting
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Gate Error Handling
//!
//! Every rejection produced by the gate is expressed through the closed
//! [`IssueCode`] taxonomy. Callers receive either a [`ValidationResult`]
//! (non-throwing report form) or a [`GateError`] carrying one or more
//! [`ValidationIssue`]s - never a bare string and never an internal error
//! type. Unexpected internal failures are downgraded to
//! [`IssueCode::UnknownError`] with a sanitized message before they reach
//! the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of rejection codes emitted by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCode {
    /// Query text is empty after comment stripping and normalization
    #[serde(rename = "EMPTY_QUERY")]
    EmptyQuery,
    /// More than one statement submitted (interior `;`)
    #[serde(rename = "MULTI_STATEMENT")]
    MultiStatement,
    /// Statement does not start with `SELECT`, `WITH`, or `(SELECT`
    #[serde(rename = "NOT_SELECT")]
    NotSelect,
    /// `SELECT ... INTO` creates a table as a side effect
    #[serde(rename = "SELECT_INTO")]
    SelectInto,
    /// Locking clause (`FOR UPDATE`, `FOR SHARE`, ...) present
    #[serde(rename = "LOCKING")]
    Locking,
    /// Blocklisted function referenced outside a string literal
    #[serde(rename = "BLOCKED_FUNC")]
    BlockedFunc,
    /// Write-class keyword inside a `WITH` clause body
    #[serde(rename = "NON_SELECT_CTE")]
    NonSelectCte,
    /// Structural parse found a write-class operation in the tree
    #[serde(rename = "DANGEROUS_OPERATION")]
    DangerousOperation,
    /// Statement failed the generic grammar and matched no dialect extension
    #[serde(rename = "PARSE_ERROR")]
    ParseError,
    /// Internal failure, downgraded and sanitized
    #[serde(rename = "UNKNOWN_ERROR")]
    UnknownError,
}

impl IssueCode {
    /// Wire name used in JSON responses and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyQuery => "EMPTY_QUERY",
            Self::MultiStatement => "MULTI_STATEMENT",
            Self::NotSelect => "NOT_SELECT",
            Self::SelectInto => "SELECT_INTO",
            Self::Locking => "LOCKING",
            Self::BlockedFunc => "BLOCKED_FUNC",
            Self::NonSelectCte => "NON_SELECT_CTE",
            Self::DangerousOperation => "DANGEROUS_OPERATION",
            Self::ParseError => "PARSE_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// HTTP status the route layer should map this code to
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::UnknownError => 500,
            _ => 400,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rejection reason with its human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Rejection code from the closed taxonomy
    pub code: IssueCode,
    /// Human-readable explanation (never contains parameter values)
    pub message: String,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Non-throwing validation report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the statement may run
    pub valid: bool,
    /// Empty when `valid` is true
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Accepting result with no issues
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }

    /// Rejecting result carrying the given issues
    #[must_use]
    pub fn rejected(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: false,
            issues,
        }
    }

    /// Rejecting result with a single issue
    #[must_use]
    pub fn single(code: IssueCode, message: impl Into<String>) -> Self {
        Self::rejected(vec![ValidationIssue::new(code, message)])
    }

    /// Code of the first issue, if any
    #[must_use]
    pub fn first_code(&self) -> Option<IssueCode> {
        self.issues.first().map(|i| i.code)
    }
}

/// Error form of a gate rejection, carrying one or more issues
#[derive(Debug, Clone, Error)]
#[error("query rejected with {} issue(s): {}", .issues.len(), self.codes_joined())]
pub struct GateError {
    /// The issues that caused the rejection (never empty)
    pub issues: Vec<ValidationIssue>,
}

impl GateError {
    /// Build from accumulated issues
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        debug_assert!(!issues.is_empty());
        Self { issues }
    }

    /// Build from a single code and message
    pub fn single(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue::new(code, message)],
        }
    }

    /// All issue codes in order
    #[must_use]
    pub fn codes(&self) -> Vec<IssueCode> {
        self.issues.iter().map(|i| i.code).collect()
    }

    /// HTTP status for the response: 500 if any issue is internal, else 400
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.issues
            .iter()
            .map(|i| i.code.http_status())
            .max()
            .unwrap_or(400)
    }

    fn codes_joined(&self) -> String {
        self.issues
            .iter()
            .map(|i| i.code.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<GateError> for ValidationResult {
    fn from(err: GateError) -> Self {
        Self::rejected(err.issues)
    }
}

/// Result type used throughout the gate
pub type GateResult<T> = Result<T, GateError>;

/// JSON body shape the route layer sends for a rejection
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error envelope
    pub error: ErrorResponseDetails,
}

/// Inner error payload
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// First (primary) rejection code
    pub code: IssueCode,
    /// Combined human-readable message
    pub message: String,
    /// Remaining codes when more than one issue accumulated
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub additional_codes: Vec<IssueCode>,
}

impl From<&GateError> for ErrorResponse {
    fn from(err: &GateError) -> Self {
        let code = err.issues.first().map_or(IssueCode::UnknownError, |i| i.code);
        let message = err
            .issues
            .iter()
            .map(|i| i.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let additional_codes = err.issues.iter().skip(1).map(|i| i.code).collect();
        Self {
            error: ErrorResponseDetails {
                code,
                message,
                additional_codes,
            },
        }
    }
}
