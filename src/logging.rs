//! tracing setup for the two ways `sidecar` runs.
//!
//! One-shot commands (`list`, `set`, `rank`, ...) keep stderr quiet and
//! short so their stdout can be piped. `serve` is long-running: it logs at
//! info by default, with timestamps and targets, so requests and refreshes
//! can be followed. `RUST_LOG` overrides either default.

use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// How the process is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// A single CLI command that exits when done.
    Command,
    /// The dashboard API server.
    Server,
}

/// Install the global subscriber.
///
/// With `log_file`, every event is also written there as JSON lines.
///
/// # Errors
///
/// Returns an error if the filter does not parse, the log file cannot be
/// created, or a subscriber is already installed.
pub fn init_logging(mode: LogMode, verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(mode, verbosity, quiet)))?;
    let ansi = std::io::stderr().is_terminal();

    let command_layer = (mode == LogMode::Command).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_target(false)
            .without_time()
    });
    let server_layer = (mode == LogMode::Server).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_target(true)
    });

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false).json())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(command_layer)
        .with(server_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

fn default_filter(mode: LogMode, verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "sidecar=error";
    }
    match (mode, verbosity) {
        (LogMode::Command, 0) => "sidecar=warn",
        (LogMode::Command, 1) | (LogMode::Server, 0) => "sidecar=info",
        (LogMode::Command, 2) => "sidecar=debug,reqwest=info",
        (LogMode::Server, 1) => "sidecar=debug,axum=info",
        (LogMode::Server, 2) => "sidecar=debug,axum=debug,reqwest=debug",
        _ => "sidecar=trace,axum=debug,reqwest=debug,hyper=info",
    }
}

/// Route events to the test harness output, once per test binary.
pub fn init_test_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("sidecar=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}
