//! Error types emitted by the loopstat CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use loopstat_core::MatcherError;
use loopstat_data::IngestError;
use thiserror::Error;

/// Errors emitted by the loopstat CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without leading dashes.
        field: &'static str,
        /// Environment variable that also sets the option.
        env: &'static str,
    },
    /// A count option was zero.
    #[error("--{field} must be at least 1")]
    ZeroCount {
        /// Flag name without leading dashes.
        field: &'static str,
    },
    /// Two options that select the same thing were both set.
    #[error("--{first} and --{second} cannot be combined")]
    ConflictingArguments {
        /// First flag name.
        first: &'static str,
        /// Second flag name.
        second: &'static str,
    },
    /// An entity pattern was rejected.
    #[error("invalid --{field} pattern: {source}")]
    InvalidMatcher {
        /// Flag name without leading dashes.
        field: &'static str,
        /// Underlying matcher error.
        #[source]
        source: MatcherError,
    },
    /// The requested indicator is not in the catalogue.
    #[error("indicator {id:?} is not in the catalogue")]
    UnknownIndicator {
        /// Requested identifier.
        id: String,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag name without leading dashes.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag name without leading dashes.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag name without leading dashes.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The data directory is missing or is not a directory.
    #[error("data directory {path:?} does not exist or is not a directory")]
    DataDirectoryNotDirectory {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// The output directory exists but is not a directory.
    #[error("output directory {path:?} is not a directory")]
    OutputDirectoryNotDirectory {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// Reading observations or a catalogue failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),
    /// Serialising a view failed.
    #[error("failed to serialise view: {0}")]
    SerialiseView(#[source] serde_json::Error),
    /// Writing to standard output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
    /// Creating or writing an output file failed.
    #[error("failed to write {path:?}: {source}")]
    WriteOutputFile {
        /// Destination file.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
