//! Subcommand implementations.
//!
//! Each module exposes `execute`, called from `main` with the parsed args,
//! the `--json` flag and the CLI config overrides.

pub mod columns;
pub mod list;
pub mod rank;
pub mod refresh;
pub mod serve;
pub mod set;
pub mod statuses;

use crate::config::{CliOverrides, Settings};
use crate::dashboard::Dashboard;
use crate::error::{Result, SidecarError, StructuredError};
use crate::linear::LinearClient;
use crate::overlay::OverlayStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Resolve settings from every config layer.
pub(crate) fn load_settings(cli: &CliOverrides) -> Result<Settings> {
    let settings = Settings::load(cli)?;
    debug!(
        data_dir = %settings.data_dir.display(),
        overlay = %settings.overlay_path.display(),
        "Resolved settings"
    );
    Ok(settings)
}

pub(crate) fn open_store(settings: &Settings) -> OverlayStore {
    OverlayStore::open(settings.overlay_path.clone())
}

/// Dashboard backed by the real Linear client.
pub(crate) fn open_dashboard(settings: &Settings) -> Result<Dashboard> {
    let client = LinearClient::new(settings.linear.clone())?;
    Ok(Dashboard::new(open_store(settings), Arc::new(client))
        .with_release_completed_ranks(settings.release_completed_ranks))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Structured form of a command error. Unknown identifiers get "did you
/// mean" hints drawn from the overlay.
#[must_use]
pub fn describe_error(err: &SidecarError, cli: &CliOverrides) -> StructuredError {
    if let SidecarError::UnknownIssue { id } = err {
        if let Ok(settings) = Settings::load(cli) {
            let known = open_store(&settings).load().known_ids();
            return StructuredError::unknown_issue(id, &known);
        }
    }
    StructuredError::from_error(err)
}
