use crate::cli::SetArgs;
use crate::config::CliOverrides;
use crate::error::{Result, SidecarError};
use crate::model::PersonalStatus;
use crate::overlay::{OverlayPatch, PriorityChange};
use serde::Serialize;

#[derive(Serialize)]
struct SetOutput<'a> {
    id: &'a str,
    notes: &'a str,
    personal_priority: Option<u32>,
    personal_status: PersonalStatus,
    last_updated: Option<String>,
}

/// Execute the set command.
///
/// # Errors
///
/// Returns a validation error for bad input, or an I/O error if the save
/// fails.
pub fn execute(args: &SetArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let patch = build_patch(args)?;
    if patch.is_empty() {
        return Err(SidecarError::validation(
            "set",
            "nothing to change; pass --notes, --status, --priority or --clear-priority",
        ));
    }

    let settings = super::load_settings(cli)?;
    let store = super::open_store(&settings);
    let outcome = store.upsert(&args.id, &patch)?;

    let output = SetOutput {
        id: &outcome.id,
        notes: &outcome.record.notes,
        personal_priority: outcome.record.personal_priority,
        personal_status: outcome.record.personal_status,
        last_updated: outcome
            .record
            .last_updated
            .as_ref()
            .map(crate::util::time::format_overlay_timestamp),
    };

    if json {
        return super::print_json(&output);
    }

    let rank = output
        .personal_priority
        .map_or_else(|| "none".to_string(), |r| r.to_string());
    let status = if output.personal_status.is_none() {
        "none"
    } else {
        output.personal_status.as_str()
    };
    println!("Saved {} (priority {rank}, status {status})", output.id);
    if outcome.ranks_changed {
        for (position, id) in outcome.document.ranked_ids().iter().enumerate() {
            println!("  {}. {id}", position + 1);
        }
    }
    Ok(())
}

fn build_patch(args: &SetArgs) -> Result<OverlayPatch> {
    let personal_status = args
        .status
        .as_deref()
        .map(str::parse::<PersonalStatus>)
        .transpose()?;
    let personal_priority = if args.clear_priority {
        Some(PriorityChange::Clear)
    } else {
        args.priority.map(PriorityChange::Set)
    };

    Ok(OverlayPatch {
        notes: args.notes.clone(),
        personal_status,
        personal_priority,
    })
}
