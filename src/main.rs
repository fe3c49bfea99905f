use clap::Parser;
use sidecar::cli::commands;
use sidecar::cli::{Cli, Commands};
use sidecar::config;
use sidecar::logging::{LogMode, init_logging};
use sidecar::SidecarError;
use std::io::{self, IsTerminal};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_mode = match cli.command {
        Commands::Serve(_) => LogMode::Server,
        _ => LogMode::Command,
    };
    if let Err(e) = init_logging(log_mode, cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = build_cli_overrides(&cli);

    let result = match &cli.command {
        Commands::Serve(args) => commands::serve::execute(args, &overrides).await,
        Commands::List(args) => commands::list::execute(args, cli.json, &overrides).await,
        Commands::Refresh(args) => commands::refresh::execute(args, cli.json, &overrides).await,
        Commands::Set(args) => commands::set::execute(args, cli.json, &overrides),
        Commands::Rank(args) => commands::rank::execute(args, cli.json, &overrides),
        Commands::Columns(args) => commands::columns::execute(args, cli.json, &overrides),
        Commands::Statuses => commands::statuses::execute(cli.json),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json, &overrides);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &SidecarError, json_mode: bool, overrides: &config::CliOverrides) -> ! {
    let structured = commands::describe_error(err, overrides);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> config::CliOverrides {
    config::CliOverrides {
        data_dir: cli.data_dir.clone(),
        overlay: cli.overlay.clone(),
        ..Default::default()
    }
}
