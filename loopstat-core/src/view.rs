//! Panel recipes and the views they produce.
//!
//! A [`ViewSpec`] captures everything a dashboard panel decides about a
//! table: which periods to show, how many entities, and how to emphasise
//! them. [`build_view`] applies a spec to a table.

use std::num::NonZeroUsize;

use log::debug;

use crate::{
    Aggregation, EntityMatcher, FramePoint, ObservationTable, PeriodRankings, PeriodWindow,
    RankingOptions, SeriesPoint, Snapshot, TableFilter, TieredRanking, latest_snapshot,
    rank_window, select_recent_periods, tiered_series, top_n_per_period,
};

/// Independent top-N ranking per period, animated frame by frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FramesSpec {
    /// Number of recent periods; `None` keeps every period.
    #[cfg_attr(feature = "serde", serde(default))]
    pub window: Option<NonZeroUsize>,
    /// Entities ranked per period.
    pub top_n: NonZeroUsize,
}

/// One ranking over the whole window, drawn as tiered trend lines.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrendSpec {
    /// Number of recent periods.
    pub window: NonZeroUsize,
    /// Entities kept from the aggregate ranking.
    pub top_n: NonZeroUsize,
    /// Leading ranks drawn as the top tier.
    pub top_tier_size: usize,
    /// Entity emphasised regardless of rank.
    #[cfg_attr(feature = "serde", serde(default))]
    pub spotlight: Option<EntityMatcher>,
    /// How values are folded across the window.
    #[cfg_attr(feature = "serde", serde(default))]
    pub aggregation: Aggregation,
    /// Refill the top tier when the spotlight ranks inside it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub backfill_top_tier: bool,
}

impl TrendSpec {
    /// Ranking parameters of this recipe.
    #[must_use]
    pub fn ranking_options(&self) -> RankingOptions {
        RankingOptions {
            top_n: self.top_n,
            top_tier_size: self.top_tier_size,
            spotlight: self.spotlight.clone(),
            aggregation: self.aggregation,
            backfill_top_tier: self.backfill_top_tier,
        }
    }
}

/// What a panel shows.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use loopstat_core::{FramesSpec, Observation, ObservationTable, TableFilter, View, ViewSpec, build_view};
///
/// let table = ObservationTable::from_rows([
///     Observation::new("A", 2020, 5.0),
///     Observation::new("B", 2020, 9.0),
/// ]);
/// let spec = ViewSpec::RankedFrames(FramesSpec {
///     window: NonZeroUsize::new(20),
///     top_n: NonZeroUsize::new(1).expect("non-zero"),
/// });
/// let View::Frames { frames, .. } = build_view(&table, &spec, &TableFilter::default()) else {
///     panic!("frames spec yields a frames view");
/// };
/// assert_eq!(frames.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ViewSpec {
    /// Per-period top-N frames.
    RankedFrames(FramesSpec),
    /// Window-ranked tiered trend lines.
    TieredTrend(TrendSpec),
    /// Every entity at the latest period.
    LatestSnapshot,
}

/// The data a renderer needs for one panel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum View {
    /// Output of [`ViewSpec::RankedFrames`].
    Frames {
        /// Periods covered.
        window: PeriodWindow,
        /// Rankings per period.
        rankings: PeriodRankings,
        /// Rankings flattened into frame points.
        frames: Vec<FramePoint>,
    },
    /// Output of [`ViewSpec::TieredTrend`].
    Trend {
        /// Periods covered.
        window: PeriodWindow,
        /// Aggregate ranking and tier split.
        ranking: TieredRanking,
        /// Renderer tuples in draw order.
        series: Vec<SeriesPoint>,
    },
    /// Output of [`ViewSpec::LatestSnapshot`].
    Snapshot {
        /// Latest period rows; `None` for an empty table.
        snapshot: Option<Snapshot>,
    },
}

/// Apply `filter` then `spec` to `table`.
#[must_use]
pub fn build_view(table: &ObservationTable, spec: &ViewSpec, filter: &TableFilter) -> View {
    let rows = table.filtered(filter);
    match spec {
        ViewSpec::RankedFrames(frames_spec) => {
            let window = frames_spec.window.map_or_else(
                || PeriodWindow::all(&rows),
                |k| select_recent_periods(&rows, k),
            );
            let rankings = top_n_per_period(&rows, &window, frames_spec.top_n);
            let frames = rankings.frames();
            debug!(
                "built {} frame points across {} periods",
                frames.len(),
                window.len()
            );
            View::Frames {
                window,
                rankings,
                frames,
            }
        }
        ViewSpec::TieredTrend(trend_spec) => {
            let window = select_recent_periods(&rows, trend_spec.window);
            let ranking = rank_window(&rows, &window, &trend_spec.ranking_options());
            let series = tiered_series(&rows, &window, &ranking.tiers);
            View::Trend {
                window,
                ranking,
                series,
            }
        }
        ViewSpec::LatestSnapshot => View::Snapshot {
            snapshot: latest_snapshot(&rows),
        },
    }
}
