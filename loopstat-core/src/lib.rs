//! Core ranking and selection for long-format indicator tables.
//!
//! The crate turns `(entity, period, value)` observations into the inputs of
//! ranked charts: a window of recent periods, an independent top-N per
//! period, and a single aggregate ranking split into display tiers. The
//! functions here are pure; loading data lives behind [`ObservationSource`].

#![forbid(unsafe_code)]

mod matcher;
mod observation;
mod select;
mod source;
mod tier;
mod view;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use matcher::{EntityMatcher, MatcherError};
pub use observation::{Observation, ObservationTable, Period, TableFilter};
pub use select::{
    Aggregation, EntityTotals, FramePoint, ParseAggregationError, PeriodRankings, PeriodWindow,
    RankedEntry, RankedSet, Snapshot, aggregate_for_ranking, latest_snapshot,
    select_recent_periods, top_n_per_period,
};
pub use source::ObservationSource;
pub use tier::{
    Placement, RankingOptions, SeriesPoint, Tier, TierAssignment, TieredRanking,
    assign_backfilled_tiers, assign_tiers, rank_window, tiered_series,
};
pub use view::{FramesSpec, TrendSpec, View, ViewSpec, build_view};
