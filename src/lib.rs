//! `sidecar` - personal overlay dashboard for Linear issues
//!
//! Mirrors the issues assigned to you in Linear and layers private notes,
//! a personal priority order, personal statuses and column preferences on
//! top. Linear is only ever read; annotations live in one local JSON file.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`linear`] - Read-only GraphQL client for assigned issues
//! - [`overlay`] - Persisted overlay file and personal priority ranking
//! - [`merge`] - Combining snapshots with overlay records
//! - [`view`] - Filtering and sorting the merged list
//! - [`dashboard`] - Snapshot cache and overlay behind one async API
//! - [`server`] - Local JSON HTTP API
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Layered configuration
//! - [`logging`] - tracing subscriber setup
//! - [`error`] - Error types and handling
//! - [`model`] - Data types
//! - [`util`] - Time parsing and atomic file writes

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod linear;
pub mod logging;
pub mod merge;
pub mod model;
pub mod overlay;
pub mod server;
pub mod util;
pub mod view;

pub use dashboard::Dashboard;
pub use error::{ErrorCode, Result, SidecarError, StructuredError};
pub use linear::{IssueSource, LinearClient};
pub use overlay::OverlayStore;
