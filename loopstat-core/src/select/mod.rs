//! Period windows and top-N rankings over an [`ObservationTable`].
//!
//! All functions here are total: asking for more periods or entities than
//! the table holds returns everything available, and an empty table yields
//! empty results.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use thiserror::Error;

use crate::{Observation, ObservationTable, Period};

/// The most recent distinct periods of a table, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PeriodWindow {
    periods: Vec<Period>,
}

impl PeriodWindow {
    /// Build a window from arbitrary periods; duplicates are removed and the
    /// result is sorted ascending.
    pub fn from_periods<I>(periods: I) -> Self
    where
        I: IntoIterator<Item = Period>,
    {
        let mut sorted: Vec<Period> = periods.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();
        Self { periods: sorted }
    }

    /// A window spanning every period of `table`.
    #[must_use]
    pub fn all(table: &ObservationTable) -> Self {
        Self {
            periods: table.periods(),
        }
    }

    /// Borrow the periods, ascending.
    #[must_use]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Report whether `period` falls in the window.
    #[must_use]
    pub fn contains(&self, period: Period) -> bool {
        self.periods.binary_search(&period).is_ok()
    }

    /// Earliest period in the window.
    #[must_use]
    pub fn first(&self) -> Option<Period> {
        self.periods.first().copied()
    }

    /// Latest period in the window.
    #[must_use]
    pub fn last(&self) -> Option<Period> {
        self.periods.last().copied()
    }

    /// Number of periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Report whether the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Select the `k` most recent distinct periods present in `table`.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use loopstat_core::{Observation, ObservationTable, Period, select_recent_periods};
///
/// let table = ObservationTable::from_rows([
///     Observation::new("A", 2018, 1.0),
///     Observation::new("A", 2020, 1.0),
///     Observation::new("B", 2019, 1.0),
/// ]);
/// let k = NonZeroUsize::new(20).expect("non-zero");
/// let window = select_recent_periods(&table, k);
/// assert_eq!(
///     window.periods(),
///     &[Period::new(2018), Period::new(2019), Period::new(2020)]
/// );
/// ```
#[must_use]
pub fn select_recent_periods(table: &ObservationTable, k: NonZeroUsize) -> PeriodWindow {
    let periods = table.periods();
    let skip = periods.len().saturating_sub(k.get());
    PeriodWindow {
        periods: periods.into_iter().skip(skip).collect(),
    }
}

/// An entity and the value it is ranked by.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedEntry {
    /// Entity label.
    pub entity: String,
    /// Ranking value.
    pub value: f64,
}

impl RankedEntry {
    /// Construct an entry.
    pub fn new(entity: impl Into<String>, value: f64) -> Self {
        Self {
            entity: entity.into(),
            value,
        }
    }
}

impl From<&Observation> for RankedEntry {
    fn from(row: &Observation) -> Self {
        Self::new(row.entity.clone(), row.value)
    }
}

/// Stable descending sort: equal values keep their relative input order.
pub(crate) fn sort_descending(entries: &mut [RankedEntry]) {
    entries.sort_by(|lhs, rhs| rhs.value.total_cmp(&lhs.value));
}

/// The top entities of a single period, largest value first.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedSet {
    /// The period ranked.
    pub period: Period,
    /// Entries in descending value order.
    pub entries: Vec<RankedEntry>,
}

impl RankedSet {
    /// Entity labels in rank order.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.entity.as_str())
    }

    /// Number of ranked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Report whether the period had no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One bar of an animated per-period ranking.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FramePoint {
    /// Frame period.
    pub period: Period,
    /// One-based rank within the period.
    pub rank: usize,
    /// Entity label.
    pub entity: String,
    /// Observed value.
    pub value: f64,
}

/// Independent top-N rankings for each period of a window.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PeriodRankings {
    sets: Vec<RankedSet>,
}

impl PeriodRankings {
    /// The ranking for `period`, if the window covered it.
    #[must_use]
    pub fn get(&self, period: Period) -> Option<&RankedSet> {
        self.sets.iter().find(|set| set.period == period)
    }

    /// Iterate over the rankings in ascending period order.
    pub fn iter(&self) -> std::slice::Iter<'_, RankedSet> {
        self.sets.iter()
    }

    /// Number of periods ranked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Report whether no periods were ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Union of ranked entities in order of first appearance.
    #[must_use]
    pub fn entities(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.sets
            .iter()
            .flat_map(RankedSet::entities)
            .filter(|entity| seen.insert(*entity))
            .collect()
    }

    /// Flatten into frame points ordered by period, then rank.
    #[must_use]
    pub fn frames(&self) -> Vec<FramePoint> {
        self.sets
            .iter()
            .flat_map(|set| {
                set.entries
                    .iter()
                    .zip(1_usize..)
                    .map(|(entry, rank)| FramePoint {
                        period: set.period,
                        rank,
                        entity: entry.entity.clone(),
                        value: entry.value,
                    })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a PeriodRankings {
    type Item = &'a RankedSet;
    type IntoIter = std::slice::Iter<'a, RankedSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.iter()
    }
}

/// Rank the `n` largest observations of every period in `window`.
///
/// Each period is ranked independently. Ties keep input row order. A window
/// period without rows yields an empty [`RankedSet`].
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use loopstat_core::{
///     Observation, ObservationTable, Period, PeriodWindow, top_n_per_period,
/// };
///
/// let table = ObservationTable::from_rows([
///     Observation::new("A", 2020, 5.0),
///     Observation::new("B", 2020, 9.0),
///     Observation::new("C", 2020, 2.0),
/// ]);
/// let window = PeriodWindow::all(&table);
/// let n = NonZeroUsize::new(2).expect("non-zero");
/// let rankings = top_n_per_period(&table, &window, n);
/// let top: Vec<_> = rankings
///     .get(Period::new(2020))
///     .expect("ranked period")
///     .entities()
///     .collect();
/// assert_eq!(top, vec!["B", "A"]);
/// ```
#[must_use]
pub fn top_n_per_period(
    table: &ObservationTable,
    window: &PeriodWindow,
    n: NonZeroUsize,
) -> PeriodRankings {
    let mut by_period: BTreeMap<Period, Vec<RankedEntry>> = window
        .periods()
        .iter()
        .map(|period| (*period, Vec::new()))
        .collect();
    for row in table {
        if let Some(entries) = by_period.get_mut(&row.period) {
            entries.push(RankedEntry::from(row));
        }
    }
    let sets = by_period
        .into_iter()
        .map(|(period, mut entries)| {
            sort_descending(&mut entries);
            entries.truncate(n.get());
            RankedSet { period, entries }
        })
        .collect();
    PeriodRankings { sets }
}

/// How values are folded across a window before ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Aggregation {
    /// Total over the window.
    #[default]
    Sum,
    /// Average over the periods an entity reported.
    Mean,
}

impl Aggregation {
    /// Return the aggregation as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an [`Aggregation`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown aggregation '{name}', expected sum or mean")]
pub struct ParseAggregationError {
    /// The rejected input.
    pub name: String,
}

impl FromStr for Aggregation {
    type Err = ParseAggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "mean" => Ok(Self::Mean),
            _ => Err(ParseAggregationError { name: s.to_owned() }),
        }
    }
}

/// Per-entity aggregates over a window, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityTotals {
    totals: Vec<RankedEntry>,
}

impl EntityTotals {
    /// The aggregate for `entity`, if it reported inside the window.
    #[must_use]
    pub fn get(&self, entity: &str) -> Option<f64> {
        self.totals
            .iter()
            .find(|total| total.entity == entity)
            .map(|total| total.value)
    }

    /// Iterate in order of first appearance.
    pub fn iter(&self) -> std::slice::Iter<'_, RankedEntry> {
        self.totals.iter()
    }

    /// Number of entities aggregated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// Report whether nothing was aggregated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Entities sorted by aggregate, largest first; ties keep first
    /// appearance order.
    #[must_use]
    pub fn ranked(&self) -> Vec<RankedEntry> {
        let mut ranking = self.totals.clone();
        sort_descending(&mut ranking);
        ranking
    }
}

struct Accumulator {
    entity: String,
    sum: f64,
    count: f64,
}

/// Fold every entity's values over `window` into one ranking value.
///
/// The result is ranked once and reused for every period of a chart, so an
/// entity's position does not change from frame to frame.
///
/// # Examples
/// ```
/// use loopstat_core::{
///     Aggregation, Observation, ObservationTable, PeriodWindow, aggregate_for_ranking,
/// };
///
/// let table = ObservationTable::from_rows([
///     Observation::new("A", 2019, 1.0),
///     Observation::new("B", 2019, 4.0),
///     Observation::new("A", 2020, 5.0),
/// ]);
/// let totals = aggregate_for_ranking(&table, &PeriodWindow::all(&table), Aggregation::Sum);
/// assert_eq!(totals.get("A"), Some(6.0));
/// assert_eq!(totals.ranked().first().map(|e| e.entity.as_str()), Some("A"));
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "aggregation sums and averages observation values"
)]
pub fn aggregate_for_ranking(
    table: &ObservationTable,
    window: &PeriodWindow,
    aggregation: Aggregation,
) -> EntityTotals {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut accumulators: Vec<Accumulator> = Vec::new();
    for row in table.iter().filter(|row| window.contains(row.period)) {
        if let Some(acc) = slots
            .get(row.entity.as_str())
            .and_then(|slot| accumulators.get_mut(*slot))
        {
            acc.sum += row.value;
            acc.count += 1.0;
        } else {
            slots.insert(row.entity.as_str(), accumulators.len());
            accumulators.push(Accumulator {
                entity: row.entity.clone(),
                sum: row.value,
                count: 1.0,
            });
        }
    }
    let totals = accumulators
        .into_iter()
        .map(|acc| {
            let value = match aggregation {
                Aggregation::Sum => acc.sum,
                Aggregation::Mean => acc.sum / acc.count,
            };
            RankedEntry::new(acc.entity, value)
        })
        .collect();
    EntityTotals { totals }
}

/// Every observation of the latest period, in input order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// The latest period in the table.
    pub period: Period,
    /// Observations reported for that period.
    pub entries: Vec<RankedEntry>,
}

/// Capture the latest period of `table`, or `None` when it is empty.
#[must_use]
pub fn latest_snapshot(table: &ObservationTable) -> Option<Snapshot> {
    let period = table.latest_period()?;
    let entries = table
        .iter()
        .filter(|row| row.period == period)
        .map(RankedEntry::from)
        .collect();
    Some(Snapshot { period, entries })
}
