//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Personal overlay dashboard for Linear issues
#[derive(Parser, Debug)]
#[command(name = "sidecar", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: $SIDECAR_DIR, then ~/.sidecar)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Overlay file path (default: <data-dir>/overlay.json)
    #[arg(long, global = true)]
    pub overlay: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the local dashboard API
    Serve(ServeArgs),

    /// Fetch assigned issues and show them with personal annotations
    List(ListArgs),

    /// Refetch from Linear and show a summary
    Refresh(RefreshArgs),

    /// Save notes, personal status or personal priority for an issue
    Set(SetArgs),

    /// Reorder an issue's personal priority
    Rank(RankArgs),

    /// Show or change the visible dashboard columns
    Columns(ColumnsArgs),

    /// List the personal status options
    Statuses,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to listen on (default: 127.0.0.1:5000)
    #[arg(long)]
    pub bind: Option<String>,

    /// Clear personal priorities of completed issues on refresh
    #[arg(long)]
    pub release_completed_ranks: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// active, completed or all
    #[arg(long)]
    pub filter: Option<String>,

    /// Sort key (cycle, personal_priority, linear_priority, updated_at, ...)
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort direction: asc or desc
    #[arg(long)]
    pub dir: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RefreshArgs {
    /// Clear personal priorities of completed issues
    #[arg(long)]
    pub release_completed_ranks: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Issue identifier (e.g. LIN-42)
    pub id: String,

    /// Replace the notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Personal status (see `sidecar statuses`)
    #[arg(long)]
    pub status: Option<String>,

    /// Move to this personal priority position (1 = top)
    #[arg(long, conflicts_with = "clear_priority")]
    pub priority: Option<i64>,

    /// Remove the personal priority
    #[arg(long)]
    pub clear_priority: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RankArgs {
    /// Issue identifier
    pub id: String,

    #[command(subcommand)]
    pub action: RankCommand,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum RankCommand {
    /// Move to a position (1 = top); past the end moves to the bottom
    Move {
        position: i64,
    },
    /// Swap with the issue above
    Up,
    /// Swap with the issue below
    Down,
    /// Remove the personal priority
    Clear,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ColumnsArgs {
    /// Comma-separated visible columns, in order
    #[arg(long, value_delimiter = ',', conflicts_with = "reset")]
    pub set: Option<Vec<String>>,

    /// Show every column again
    #[arg(long)]
    pub reset: bool,
}
