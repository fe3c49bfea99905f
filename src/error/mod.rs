//! Error types and handling for `sidecar`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for glue code
//! - Provides recovery hints for user-facing errors
//! - Maps every error onto a stable code, an exit code and an HTTP status
//! - Provides structured JSON output for the CLI and the HTTP API

mod structured;

pub use structured::{ErrorCode, StructuredError, find_similar_ids};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `sidecar` operations.
#[derive(Error, Debug)]
pub enum SidecarError {
    // === Overlay Errors ===
    /// No overlay record exists for the identifier.
    #[error("No overlay record for issue: {id}")]
    UnknownIssue { id: String },

    /// Issue identifier is empty or malformed.
    #[error("Invalid issue ID: '{id}'")]
    InvalidIssueId { id: String },

    /// The record exists but carries no personal priority.
    #[error("Issue has no personal priority: {id}")]
    NotRanked { id: String },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Personal status outside the fixed set.
    #[error("Invalid personal status: {status}")]
    InvalidStatus { status: String },

    /// Rank position must be a positive integer.
    #[error("Position must be 1 or greater, got: {position}")]
    InvalidPosition { position: i64 },

    /// Column name outside the fixed set.
    #[error("Unknown column: {column}")]
    InvalidColumn { column: String },

    /// Sort key or direction not recognised.
    #[error("Invalid sort: {sort}")]
    InvalidSort { sort: String },

    // === Remote Errors ===
    /// Linear rejected the API key.
    #[error("Linear rejected the API key (401)")]
    AuthRejected,

    /// Linear answered with a non-success HTTP status.
    #[error("Linear returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    /// GraphQL-level errors in an otherwise successful response.
    #[error("Linear API errors: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },

    /// Transport failure talking to Linear.
    #[error("Linear request failed: {0}")]
    Remote(#[from] reqwest::Error),

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No Linear token could be resolved.
    #[error("LINEAR_GRAPHQL_API or LINEAR_GRAPHQL_API_FILE is not set")]
    MissingToken,

    /// Data directory could not be determined.
    #[error("Cannot determine data directory (set SIDECAR_DIR or HOME)")]
    NoDataDir,

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error touching a specific path.
    #[error("I/O error at '{path}': {source}")]
    PathIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Wrapped errors ===
    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SidecarError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownIssue { .. }
                | Self::InvalidIssueId { .. }
                | Self::NotRanked { .. }
                | Self::Validation { .. }
                | Self::InvalidStatus { .. }
                | Self::InvalidPosition { .. }
                | Self::InvalidColumn { .. }
                | Self::InvalidSort { .. }
                | Self::AuthRejected
                | Self::MissingToken
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::UnknownIssue { .. } => Some("Save a note or status for the issue first"),
            Self::NotRanked { .. } => Some("Give the issue a position with: sidecar rank <ID> move 1"),
            Self::InvalidPosition { .. } => Some("Positions start at 1"),
            Self::InvalidColumn { .. } => Some(
                "Valid columns: identifier, title, linear_status, linear_priority, personal_priority, personal_status, notes, team, cycle, labels, updated_at, last_updated",
            ),
            Self::InvalidSort { .. } => Some(
                "Valid sorts: cycle, personal_priority, linear_priority, linear_status, personal_status, updated_at, last_updated, cycle_name, labels, team, title, identifier",
            ),
            Self::AuthRejected => Some(
                "Use a Linear personal API key (Settings -> API -> Personal API Keys), not an OAuth token",
            ),
            Self::MissingToken => {
                Some("Set LINEAR_GRAPHQL_API, or LINEAR_GRAPHQL_API_FILE with the path to a token file")
            }
            Self::NoDataDir => Some("Pass --data-dir or set SIDECAR_DIR"),
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attach the path to an I/O error.
    #[must_use]
    pub fn path_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PathIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type using `SidecarError`.
pub type Result<T> = std::result::Result<T, SidecarError>;
