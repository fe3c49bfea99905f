use crate::cli::ServeArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use crate::server;
use std::sync::Arc;
use tracing::info;

/// Execute the serve command.
///
/// # Errors
///
/// Returns an error if settings are invalid or the server cannot start.
pub async fn execute(args: &ServeArgs, cli: &CliOverrides) -> Result<()> {
    let mut overrides = cli.clone();
    if let Some(bind) = &args.bind {
        overrides.bind = Some(bind.clone());
    }
    if args.release_completed_ranks {
        overrides.release_completed_ranks = Some(true);
    }

    let settings = super::load_settings(&overrides)?;
    info!(
        overlay = %settings.overlay_path.display(),
        release_completed_ranks = settings.release_completed_ranks,
        "Starting dashboard"
    );
    let dashboard = Arc::new(super::open_dashboard(&settings)?);
    server::serve(dashboard, settings.bind).await
}
