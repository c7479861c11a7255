//! Command-line interface for loopstat's indicator selections.
//!
//! Each subcommand reads long-format observation data and prints the
//! resulting view as pretty JSON. Options come from CLI flags, configuration
//! files, or `LOOPSTAT_CMDS_<SUBCOMMAND>_<FIELD>` environment variables,
//! merged by `ortho_config`.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod dashboard;
mod error;
mod output;
mod view_command;

pub use error::CliError;

use dashboard::{DashboardArgs, run_dashboard_with};
use view_command::{FramesArgs, SnapshotArgs, TrendArgs, run_view_with};

pub(crate) const ARG_INPUT: &str = "input";
pub(crate) const ARG_WINDOW: &str = "window";
pub(crate) const ARG_TOP_N: &str = "top-n";
pub(crate) const ARG_TOP_TIER: &str = "top-tier";
pub(crate) const ARG_BACKFILL_TOP_TIER: &str = "backfill-top-tier";
pub(crate) const ARG_EXCLUDE: &str = "exclude";
pub(crate) const ARG_EXCLUDE_CONTAINING: &str = "exclude-containing";
pub(crate) const ARG_SINCE: &str = "since";
pub(crate) const ARG_SPOTLIGHT: &str = "spotlight";
pub(crate) const ARG_SPOTLIGHT_CONTAINING: &str = "spotlight-containing";
pub(crate) const ARG_AGGREGATION: &str = "aggregation";
pub(crate) const ARG_DATA_DIR: &str = "data-dir";
pub(crate) const ARG_CATALOG: &str = "catalog";
pub(crate) const ARG_OUTPUT_DIR: &str = "output-dir";
pub(crate) const ARG_INDICATOR: &str = "indicator";
pub(crate) const ENV_FRAMES_INPUT: &str = "LOOPSTAT_CMDS_FRAMES_INPUT";
pub(crate) const ENV_TREND_INPUT: &str = "LOOPSTAT_CMDS_TREND_INPUT";
pub(crate) const ENV_SNAPSHOT_INPUT: &str = "LOOPSTAT_CMDS_SNAPSHOT_INPUT";

pub(crate) const DEFAULT_WINDOW: usize = 20;
pub(crate) const DEFAULT_TOP_N: usize = 10;
pub(crate) const DEFAULT_TOP_TIER: usize = 3;

/// Run the loopstat CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments fail to parse or merge, when inputs
/// are missing or unreadable, or when output cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    init_logging(cli.verbose);
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &mut stdout)
}

fn dispatch(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Frames(args) => run_view_with(args.into_config()?, writer),
        Command::Trend(args) => run_view_with(args.into_config()?, writer),
        Command::Snapshot(args) => run_view_with(args.into_config()?, writer),
        Command::Dashboard(args) => run_dashboard_with(args, writer),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        log::debug!("logging already initialised: {err}");
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "loopstat",
    about = "Rank, window and tier circular economy indicators for plotting",
    version
)]
struct Cli {
    /// Log progress at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank the top entities independently in each recent period.
    Frames(FramesArgs),
    /// Rank entities over a window and split them into tiers.
    Trend(TrendArgs),
    /// Show every entity at the latest period.
    Snapshot(SnapshotArgs),
    /// Render every panel of an indicator catalogue.
    Dashboard(DashboardArgs),
}

/// Check that `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match loopstat_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests;
