//! Facade crate for the loopstat indicator selector.
//!
//! This crate re-exports the core selection types and exposes CSV ingestion
//! and indicator catalogues behind the `data` feature.

#![forbid(unsafe_code)]

pub use loopstat_core::{
    Aggregation, EntityMatcher, EntityTotals, FramePoint, FramesSpec, MatcherError, Observation,
    ObservationSource, ObservationTable, ParseAggregationError, Period, PeriodRankings,
    PeriodWindow, Placement, RankedEntry, RankedSet, RankingOptions, SeriesPoint, Snapshot,
    TableFilter, Tier, TierAssignment, TieredRanking, TrendSpec, View, ViewSpec,
    aggregate_for_ranking, assign_backfilled_tiers, assign_tiers, build_view, latest_snapshot,
    rank_window, select_recent_periods, tiered_series, top_n_per_period,
};

#[cfg(feature = "data")]
pub use loopstat_data::{
    ColumnMapping, CsvObservationSource, EntityAliases, IndicatorCatalog, IndicatorDefinition,
    IndicatorView, IngestError, IngestOptions, IngestReport, SkipReason, SkippedRows,
    read_observations, read_observations_from, render_indicator,
};
