//! CSV ingestion into observation tables.
//!
//! Files are read with a header row. The mapped columns must exist; rows that
//! cannot become an [`Observation`](loopstat_core::Observation), including
//! records that are not valid UTF-8, are skipped and counted in
//! [`SkippedRows`].

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use loopstat_core::{ObservationSource, ObservationTable};
use loopstat_fs::open_utf8_file;
use thiserror::Error;

mod mapping;
mod skipped;

pub use mapping::{ColumnMapping, EntityAliases};
pub use skipped::{SkipReason, SkippedRows};

/// Label used in errors for data read from an arbitrary reader.
const READER_LABEL: &str = "<reader>";

/// Errors raised while reading indicator data or catalogues.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The data file could not be opened.
    #[error("failed to open {path}")]
    Open {
        /// File that was opened.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The header row could not be read.
    #[error("failed to read the CSV header of {path}")]
    ReadHeader {
        /// File being read.
        path: Utf8PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
    /// A record could not be read.
    #[error("failed to read CSV record at line {line} of {path}")]
    ReadRecord {
        /// File being read.
        path: Utf8PathBuf,
        /// One-based line of the failing record, or 0 when unknown.
        line: u64,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
    /// A mapped column is absent from the header row.
    #[error("{path} has no column named '{column}'")]
    MissingColumn {
        /// File being read.
        path: Utf8PathBuf,
        /// Column that was expected.
        column: String,
    },
    /// An indicator catalogue could not be read.
    #[error("failed to read indicator catalogue {path}")]
    ReadCatalog {
        /// Catalogue file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// An indicator catalogue was not valid JSON for the catalogue schema.
    #[error("failed to parse indicator catalogue {path}")]
    ParseCatalog {
        /// Catalogue file.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Two catalogue entries share an id.
    #[error("indicator catalogue {path} defines '{id}' more than once")]
    DuplicateIndicator {
        /// Catalogue file.
        path: Utf8PathBuf,
        /// Repeated indicator id.
        id: String,
    },
}

/// How to interpret a CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Columns holding entity, period and value.
    pub columns: ColumnMapping,
    /// Renames applied to entity labels.
    pub aliases: EntityAliases,
    /// Field delimiter.
    pub delimiter: u8,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::eurostat(),
            aliases: EntityAliases::default(),
            delimiter: b',',
        }
    }
}

/// The table read from one file and the rows left out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// Observations in file order.
    pub table: ObservationTable,
    /// Counts of skipped rows by reason.
    pub skipped: SkippedRows,
}

/// Read observations from a CSV file.
///
/// # Errors
/// Returns [`IngestError::Open`] when the file cannot be opened,
/// [`IngestError::MissingColumn`] when a mapped column is absent, and
/// [`IngestError::ReadHeader`] or [`IngestError::ReadRecord`] when the CSV
/// is unreadable.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use loopstat_data::{IngestOptions, read_observations};
///
/// # fn main() -> Result<(), loopstat_data::IngestError> {
/// let report = read_observations(
///     Utf8Path::new("data/municipal_waste_per_capita.csv"),
///     &IngestOptions::default(),
/// )?;
/// println!("{} rows, {} skipped", report.table.len(), report.skipped.total());
/// # Ok(())
/// # }
/// ```
pub fn read_observations(
    path: &Utf8Path,
    options: &IngestOptions,
) -> Result<IngestReport, IngestError> {
    let file = open_utf8_file(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_labelled(file, path, options)
}

/// Read observations from any reader producing CSV text.
///
/// # Errors
/// As [`read_observations`], without the open failure.
///
/// # Examples
/// ```
/// use loopstat_data::{IngestOptions, read_observations_from};
///
/// # fn main() -> Result<(), loopstat_data::IngestError> {
/// let csv = "Geopolitical entity (reporting),TIME_PERIOD,OBS_VALUE\n\
///            Austria,2021,62.3\n\
///            Belgium,2021,:\n";
/// let report = read_observations_from(csv.as_bytes(), &IngestOptions::default())?;
/// assert_eq!(report.table.len(), 1);
/// assert_eq!(report.skipped.missing_value, 1);
/// # Ok(())
/// # }
/// ```
pub fn read_observations_from<R: io::Read>(
    reader: R,
    options: &IngestOptions,
) -> Result<IngestReport, IngestError> {
    read_labelled(reader, Utf8Path::new(READER_LABEL), options)
}

fn read_labelled<R: io::Read>(
    reader: R,
    path: &Utf8Path,
    options: &IngestOptions,
) -> Result<IngestReport, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|source| IngestError::ReadHeader {
            path: path.to_path_buf(),
            source,
        })?;
    let columns = options
        .columns
        .locate(headers)
        .map_err(|column| IngestError::MissingColumn {
            path: path.to_path_buf(),
            column,
        })?;

    let mut rows = Vec::new();
    let mut skipped = SkippedRows::default();
    for result in csv_reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(source) if matches!(source.kind(), csv::ErrorKind::Utf8 { .. }) => {
                debug!(
                    "skipping non UTF-8 record at line {} of {path}",
                    source.position().map_or(0, csv::Position::line)
                );
                skipped.record(SkipReason::InvalidEncoding);
                continue;
            }
            Err(source) => {
                return Err(IngestError::ReadRecord {
                    path: path.to_path_buf(),
                    line: source.position().map_or(0, csv::Position::line),
                    source,
                });
            }
        };
        match columns.observation(&record, &options.aliases) {
            Ok(observation) => rows.push(observation),
            Err(reason) => skipped.record(reason),
        }
    }

    if skipped.total() > 0 {
        warn!(
            "skipped {} malformed rows in {path}: {skipped}",
            skipped.total()
        );
    }
    let table = ObservationTable::from_rows(rows);
    debug!("loaded {} observations from {path}", table.len());
    Ok(IngestReport { table, skipped })
}

/// An [`ObservationSource`] backed by a CSV file.
///
/// # Examples
/// ```no_run
/// use loopstat_core::ObservationSource;
/// use loopstat_data::{CsvObservationSource, IngestOptions};
///
/// # fn main() -> Result<(), loopstat_data::IngestError> {
/// let source = CsvObservationSource::new(
///     "data/Circular_material_use_rate.csv",
///     IngestOptions::default(),
/// );
/// let table = source.load()?;
/// println!("{} entities", table.entities().len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvObservationSource {
    path: Utf8PathBuf,
    options: IngestOptions,
}

impl CsvObservationSource {
    /// Describe a CSV file to be read with `options`.
    pub fn new(path: impl Into<Utf8PathBuf>, options: IngestOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// The file this source reads.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Read the file and keep the skipped-row counts.
    ///
    /// # Errors
    /// See [`read_observations`].
    pub fn report(&self) -> Result<IngestReport, IngestError> {
        read_observations(&self.path, &self.options)
    }
}

impl ObservationSource for CsvObservationSource {
    type Error = IngestError;

    fn load(&self) -> Result<ObservationTable, Self::Error> {
        self.report().map(|report| report.table)
    }
}
