use crate::cli::RefreshArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use crate::view::ViewQuery;
use serde::Serialize;

#[derive(Serialize)]
struct RefreshOutput {
    total: usize,
    active: usize,
    completed: usize,
    last_fetched: Option<String>,
}

/// Execute the refresh command.
///
/// # Errors
///
/// Returns an error if the fetch fails. The overlay is not touched then.
pub async fn execute(args: &RefreshArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut overrides = cli.clone();
    if args.release_completed_ranks {
        overrides.release_completed_ranks = Some(true);
    }
    let settings = super::load_settings(&overrides)?;
    let dashboard = super::open_dashboard(&settings)?;
    let list = dashboard.refresh(&ViewQuery::default()).await?;

    let completed = list.issues.iter().filter(|i| i.issue.is_completed).count();
    let output = RefreshOutput {
        total: list.issues.len(),
        active: list.issues.len() - completed,
        completed,
        last_fetched: list.last_fetched.map(|t| t.to_rfc3339()),
    };

    if json {
        super::print_json(&output)
    } else {
        println!(
            "Fetched {} issue(s): {} active, {} completed",
            output.total, output.active, output.completed
        );
        Ok(())
    }
}
