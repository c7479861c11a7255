//! Data access for loopstat indicator dashboards.
//!
//! Responsibilities:
//! - Read long-format indicator extracts (Eurostat SDMX-CSV and similar)
//!   into [`loopstat_core::ObservationTable`] values.
//! - Describe dashboard panels as an [`IndicatorCatalog`] and render them.
//!
//! Boundaries:
//! - Ranking and tiering rules live in `loopstat-core`.
//! - Malformed rows are skipped and counted, never fatal; structural problems
//!   such as a missing column are errors.

#![forbid(unsafe_code)]

mod catalog;
mod ingest;

pub use catalog::{IndicatorCatalog, IndicatorDefinition, IndicatorView, render_indicator};
pub use ingest::{
    ColumnMapping, CsvObservationSource, EntityAliases, IngestError, IngestOptions, IngestReport,
    SkipReason, SkippedRows, read_observations, read_observations_from,
};
