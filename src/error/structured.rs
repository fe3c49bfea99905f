//! Structured error output for the CLI and the HTTP API.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging
//!
//! Unknown identifiers get Levenshtein suggestions drawn from the overlay,
//! and misspelled personal statuses are matched against the fixed set.

#![allow(clippy::option_if_let_else)]

use crate::error::SidecarError;
use crate::model::PersonalStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Overlay Errors (exit code 3) ===
    /// No overlay record for identifier
    UnknownIssue,
    /// Identifier empty or malformed
    InvalidIssueId,
    /// Record has no personal priority
    NotRanked,

    // === Validation Errors (exit code 4) ===
    /// Field validation failed
    ValidationFailed,
    /// Invalid personal status value
    InvalidStatus,
    /// Rank position out of range
    InvalidPosition,
    /// Unknown column name
    InvalidColumn,
    /// Unknown sort key or direction
    InvalidSort,

    // === Remote Errors (exit code 5) ===
    /// Linear rejected the token
    AuthRejected,
    /// Linear answered with an error status
    RemoteStatus,
    /// GraphQL errors in the response body
    GraphQlError,
    /// Transport failure
    RemoteError,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,
    /// Linear token not configured
    MissingToken,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownIssue => "UNKNOWN_ISSUE",
            Self::InvalidIssueId => "INVALID_ISSUE_ID",
            Self::NotRanked => "NOT_RANKED",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidPosition => "INVALID_POSITION",
            Self::InvalidColumn => "INVALID_COLUMN",
            Self::InvalidSort => "INVALID_SORT",
            Self::AuthRejected => "AUTH_REJECTED",
            Self::RemoteStatus => "REMOTE_STATUS",
            Self::GraphQlError => "GRAPHQL_ERROR",
            Self::RemoteError => "REMOTE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::MissingToken => "MISSING_TOKEN",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is potentially retryable.
    ///
    /// Retryable means the caller might succeed if it:
    /// - Waits and retries (e.g., Linear unreachable)
    /// - Fixes the input and retries (e.g., validation error)
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed
                | Self::InvalidStatus
                | Self::InvalidPosition
                | Self::InvalidColumn
                | Self::InvalidSort
                | Self::RemoteStatus
                | Self::RemoteError
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 3: Overlay errors
    /// - 4: Validation errors
    /// - 5: Remote errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownIssue | Self::InvalidIssueId | Self::NotRanked => 3,
            Self::ValidationFailed
            | Self::InvalidStatus
            | Self::InvalidPosition
            | Self::InvalidColumn
            | Self::InvalidSort => 4,
            Self::AuthRejected | Self::RemoteStatus | Self::GraphQlError | Self::RemoteError => 5,
            Self::ConfigError | Self::MissingToken => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }

    /// HTTP status used when this error crosses the API boundary.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::UnknownIssue => 404,
            Self::InvalidIssueId
            | Self::NotRanked
            | Self::ValidationFailed
            | Self::InvalidStatus
            | Self::InvalidPosition
            | Self::InvalidColumn
            | Self::InvalidSort
            | Self::MissingToken => 400,
            Self::AuthRejected => 401,
            Self::RemoteStatus | Self::GraphQlError | Self::RemoteError => 502,
            Self::ConfigError
            | Self::IoError
            | Self::JsonError
            | Self::YamlError
            | Self::InternalError => 500,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `SidecarError`.
    #[must_use]
    pub fn from_error(err: &SidecarError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = Self::generate_hint(err);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Create an unknown-issue error with similar identifier suggestions.
    #[must_use]
    pub fn unknown_issue(searched_id: &str, known_ids: &[String]) -> Self {
        let similar = find_similar_ids(searched_id, known_ids, 3);

        let hint = if similar.is_empty() {
            SidecarError::UnknownIssue {
                id: searched_id.to_string(),
            }
            .suggestion()
            .map(str::to_string)
        } else if similar.len() == 1 {
            Some(format!("Did you mean '{}'?", similar[0]))
        } else {
            Some(format!("Did you mean one of: {}?", similar.join(", ")))
        };

        Self {
            code: ErrorCode::UnknownIssue,
            message: format!("No overlay record for issue: {searched_id}"),
            hint,
            retryable: false,
            context: Some(json!({
                "searched_id": searched_id,
                "similar_ids": similar,
            })),
        }
    }

    /// Serialize to the CLI JSON envelope.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Flat body used by the HTTP API (`{"error": "...", "code": ...}`).
    #[must_use]
    pub fn to_api_body(&self) -> Value {
        let mut body = json!({
            "error": self.message,
            "code": self.code.as_str(),
        });
        if let Some(hint) = &self.hint {
            body["hint"] = Value::String(hint.clone());
        }
        body
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &SidecarError) -> (ErrorCode, Option<Value>) {
        match err {
            SidecarError::UnknownIssue { id } => {
                (ErrorCode::UnknownIssue, Some(json!({"searched_id": id})))
            }
            SidecarError::InvalidIssueId { id } => {
                (ErrorCode::InvalidIssueId, Some(json!({"id": id})))
            }
            SidecarError::NotRanked { id } => (ErrorCode::NotRanked, Some(json!({"id": id}))),
            SidecarError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            SidecarError::InvalidStatus { status } => (
                ErrorCode::InvalidStatus,
                Some(json!({
                    "provided": status,
                    "valid_values": PersonalStatus::ALL
                        .iter()
                        .map(PersonalStatus::as_str)
                        .collect::<Vec<_>>(),
                })),
            ),
            SidecarError::InvalidPosition { position } => {
                (ErrorCode::InvalidPosition, Some(json!({"position": position})))
            }
            SidecarError::InvalidColumn { column } => {
                (ErrorCode::InvalidColumn, Some(json!({"column": column})))
            }
            SidecarError::InvalidSort { sort } => {
                (ErrorCode::InvalidSort, Some(json!({"sort": sort})))
            }
            SidecarError::AuthRejected => (ErrorCode::AuthRejected, None),
            SidecarError::RemoteStatus { status, .. } => {
                (ErrorCode::RemoteStatus, Some(json!({"status": status})))
            }
            SidecarError::GraphQl { messages } => {
                (ErrorCode::GraphQlError, Some(json!({"messages": messages})))
            }
            SidecarError::Remote(_) => (ErrorCode::RemoteError, None),
            SidecarError::Config(_) | SidecarError::NoDataDir => (ErrorCode::ConfigError, None),
            SidecarError::MissingToken => (ErrorCode::MissingToken, None),
            SidecarError::Io(_) => (ErrorCode::IoError, None),
            SidecarError::PathIo { path, .. } => (
                ErrorCode::IoError,
                Some(json!({"path": path.display().to_string()})),
            ),
            SidecarError::Json(_) => (ErrorCode::JsonError, None),
            SidecarError::Yaml(_) => (ErrorCode::YamlError, None),
            SidecarError::Other(_) => (ErrorCode::InternalError, None),
        }
    }

    fn generate_hint(err: &SidecarError) -> Option<String> {
        if let SidecarError::InvalidStatus { status } = err {
            if let Some(detected) = detect_status_intent(status) {
                return Some(format!("Did you mean '{}'?", detected.as_str()));
            }
        }

        err.suggestion().map(str::to_string)
    }
}

/// Shorthand spellings people type for personal statuses.
static STATUS_SYNONYMS: LazyLock<HashMap<&'static str, PersonalStatus>> = LazyLock::new(|| {
    [
        ("todo", PersonalStatus::NotStarted),
        ("new", PersonalStatus::NotStarted),
        ("wip", PersonalStatus::InProgress),
        ("working", PersonalStatus::InProgress),
        ("started", PersonalStatus::InProgress),
        ("stuck", PersonalStatus::Blocked),
        ("waiting", PersonalStatus::WaitingOnSomeone),
        ("qa", PersonalStatus::Testing),
        ("pairing", PersonalStatus::PairTesting),
        ("done", PersonalStatus::ReadyToClose),
        ("close", PersonalStatus::ReadyToClose),
    ]
    .into_iter()
    .collect()
});

/// Detect which personal status the user likely meant.
fn detect_status_intent(input: &str) -> Option<PersonalStatus> {
    let lower = input.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if let Some(status) = PersonalStatus::ALL
        .iter()
        .find(|status| status.as_str().to_lowercase() == lower)
    {
        return Some(*status);
    }

    if let Some(&status) = STATUS_SYNONYMS.get(lower.as_str()) {
        return Some(status);
    }

    PersonalStatus::ALL
        .iter()
        .find(|status| {
            let display = status.as_str().to_lowercase();
            !display.is_empty() && display.starts_with(&lower)
        })
        .copied()
}

/// Calculate the Levenshtein distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Find identifiers similar to the searched one using Levenshtein distance.
///
/// Returns up to `max_suggestions` identifiers with distance <= 3.
#[must_use]
pub fn find_similar_ids(searched: &str, existing: &[String], max_suggestions: usize) -> Vec<String> {
    let searched = searched.to_uppercase();
    let mut candidates: Vec<(usize, &str)> = existing
        .iter()
        .map(|id| (levenshtein_distance(&searched, &id.to_uppercase()), id.as_str()))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    candidates
        .into_iter()
        .take(max_suggestions)
        .map(|(_, id)| id.to_string())
        .collect()
}
