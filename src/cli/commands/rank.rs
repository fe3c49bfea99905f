use crate::cli::{RankArgs, RankCommand};
use crate::config::CliOverrides;
use crate::error::Result;
use crate::overlay::RankAction;
use serde::Serialize;

#[derive(Serialize)]
struct RankedEntry {
    position: usize,
    id: String,
}

impl From<RankCommand> for RankAction {
    fn from(command: RankCommand) -> Self {
        match command {
            RankCommand::Move { position } => Self::Move { position },
            RankCommand::Up => Self::Up,
            RankCommand::Down => Self::Down,
            RankCommand::Clear => Self::Clear,
        }
    }
}

/// Execute the rank command.
///
/// # Errors
///
/// Returns `UnknownIssue`, `NotRanked` or `InvalidPosition` without touching
/// the overlay, or an I/O error if the save fails.
pub fn execute(args: &RankArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let settings = super::load_settings(cli)?;
    let store = super::open_store(&settings);

    let document = store.reorder(&args.id, args.action.into())?;

    let ranked: Vec<RankedEntry> = document
        .ranked_ids()
        .into_iter()
        .enumerate()
        .map(|(index, id)| RankedEntry {
            position: index + 1,
            id,
        })
        .collect();

    if json {
        return super::print_json(&ranked);
    }
    if ranked.is_empty() {
        println!("No ranked issues.");
    }
    for entry in &ranked {
        let marker = if entry.id == args.id.trim() { " <" } else { "" };
        println!("{:>3}. {}{marker}", entry.position, entry.id);
    }
    Ok(())
}
