//! Display tiers for ranked entities.
//!
//! A ranking is split into a small highlighted top tier, an optional
//! spotlight entity that is always emphasised, and a muted background. The
//! split is computed once per chart so every frame styles an entity the same
//! way.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

use log::debug;

use crate::{
    Aggregation, EntityMatcher, ObservationTable, Period, PeriodWindow, RankedEntry,
    aggregate_for_ranking,
};

/// Display priority of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Tier {
    /// Highest-ranked entities.
    Top,
    /// The designated entity, regardless of rank.
    Spotlight,
    /// Remaining ranked entities.
    Background,
}

/// Where an entity landed: its tier and its position inside that tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement<'a> {
    /// Entity label.
    pub entity: &'a str,
    /// Assigned tier.
    pub tier: Tier,
    /// Zero-based position within the tier.
    pub slot: usize,
}

/// A partition of ranked entities into top, spotlight and background tiers.
///
/// Every entity appears in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierAssignment {
    top_tier: Vec<String>,
    spotlight: Option<String>,
    background: Vec<String>,
}

impl TierAssignment {
    /// Top-tier entities in rank order.
    #[must_use]
    pub fn top_tier(&self) -> &[String] {
        &self.top_tier
    }

    /// The spotlight entity, if one matched.
    #[must_use]
    pub fn spotlight(&self) -> Option<&str> {
        self.spotlight.as_deref()
    }

    /// The spotlight as a list of zero or one entity.
    #[must_use]
    pub fn spotlight_list(&self) -> &[String] {
        self.spotlight.as_slice()
    }

    /// Background entities in rank order.
    #[must_use]
    pub fn background(&self) -> &[String] {
        &self.background
    }

    /// The tier holding `entity`, if any.
    #[must_use]
    pub fn tier_of(&self, entity: &str) -> Option<Tier> {
        self.placements()
            .find(|placement| placement.entity == entity)
            .map(|placement| placement.tier)
    }

    /// Placements in draw order: top tier, spotlight, then background.
    pub fn placements(&self) -> impl Iterator<Item = Placement<'_>> {
        place(&self.top_tier, Tier::Top)
            .chain(place(self.spotlight_list(), Tier::Spotlight))
            .chain(place(&self.background, Tier::Background))
    }

    /// Total number of entities across all tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.top_tier
            .len()
            .saturating_add(self.spotlight_list().len())
            .saturating_add(self.background.len())
    }

    /// Report whether no entity was assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn place(entities: &[String], tier: Tier) -> impl Iterator<Item = Placement<'_>> {
    entities
        .iter()
        .enumerate()
        .map(move |(slot, entity)| Placement {
            entity: entity.as_str(),
            tier,
            slot,
        })
}

/// Partition `ranked` into display tiers.
///
/// The first `top_tier_size` entities form the top tier and the rest the
/// background. The first entity matched by `spotlight` is moved out of
/// whichever tier it would occupy; the top tier is not back-filled. Repeated
/// names keep only their first occurrence.
///
/// # Examples
/// ```
/// use loopstat_core::{EntityMatcher, assign_tiers};
///
/// # fn main() -> Result<(), loopstat_core::MatcherError> {
/// let spotlight = EntityMatcher::exact("Germany")?;
/// let tiers = assign_tiers(&["France", "Germany", "Italy", "Spain"], 3, Some(&spotlight));
/// assert_eq!(tiers.top_tier(), ["France", "Italy"]);
/// assert_eq!(tiers.spotlight_list(), ["Germany"]);
/// assert_eq!(tiers.background(), ["Spain"]);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn assign_tiers<S: AsRef<str>>(
    ranked: &[S],
    top_tier_size: usize,
    spotlight: Option<&EntityMatcher>,
) -> TierAssignment {
    split_tiers(ranked, top_tier_size, spotlight, false)
}

/// Partition `ranked` into display tiers, filling the top tier from the
/// entities left once the spotlight is taken out.
///
/// The top tier always holds `top_tier_size` entities when enough remain,
/// even if the spotlight ranks among the leaders.
///
/// # Examples
/// ```
/// use loopstat_core::{EntityMatcher, assign_backfilled_tiers};
///
/// # fn main() -> Result<(), loopstat_core::MatcherError> {
/// let spotlight = EntityMatcher::exact("Germany")?;
/// let tiers = assign_backfilled_tiers(&["Germany", "Austria", "Slovenia", "Malta"], 2, Some(&spotlight));
/// assert_eq!(tiers.top_tier(), ["Austria", "Slovenia"]);
/// assert_eq!(tiers.background(), ["Malta"]);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn assign_backfilled_tiers<S: AsRef<str>>(
    ranked: &[S],
    top_tier_size: usize,
    spotlight: Option<&EntityMatcher>,
) -> TierAssignment {
    split_tiers(ranked, top_tier_size, spotlight, true)
}

fn split_tiers<S: AsRef<str>>(
    ranked: &[S],
    top_tier_size: usize,
    spotlight: Option<&EntityMatcher>,
    backfill: bool,
) -> TierAssignment {
    let mut seen = HashSet::new();
    let unique: Vec<&str> = ranked
        .iter()
        .map(AsRef::as_ref)
        .filter(|entity| seen.insert(*entity))
        .collect();
    let highlighted = spotlight.and_then(|matcher| {
        unique
            .iter()
            .copied()
            .find(|entity| matcher.matches(entity))
    });

    let mut assignment = TierAssignment {
        spotlight: highlighted.map(str::to_owned),
        ..TierAssignment::default()
    };
    let mut placed = 0_usize;
    for (position, entity) in unique.into_iter().enumerate() {
        if Some(entity) == highlighted {
            continue;
        }
        let rank = if backfill { placed } else { position };
        placed = placed.saturating_add(1);
        if rank < top_tier_size {
            assignment.top_tier.push(entity.to_owned());
        } else {
            assignment.background.push(entity.to_owned());
        }
    }
    assignment
}

/// Parameters for ranking a window and splitting it into tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingOptions {
    /// Number of entities kept from the aggregate ranking.
    pub top_n: NonZeroUsize,
    /// Number of leading ranks forming the top tier.
    pub top_tier_size: usize,
    /// Entity emphasised regardless of rank.
    pub spotlight: Option<EntityMatcher>,
    /// How each entity's values are folded over the window.
    pub aggregation: Aggregation,
    /// Refill the top tier when the spotlight ranks inside it.
    pub backfill_top_tier: bool,
}

/// An aggregate ranking over a window and its tier split.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TieredRanking {
    /// The top-N entities by aggregate value.
    pub ranking: Vec<RankedEntry>,
    /// Tier split of `ranking`.
    pub tiers: TierAssignment,
}

/// Rank entities once over `window` and assign tiers to the top-N.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use loopstat_core::{
///     Aggregation, EntityMatcher, Observation, ObservationTable, PeriodWindow,
///     RankingOptions, Tier, rank_window,
/// };
///
/// # fn main() -> Result<(), loopstat_core::MatcherError> {
/// let table = ObservationTable::from_rows([
///     Observation::new("Denmark", 2020, 30.0),
///     Observation::new("Germany", 2020, 39.0),
///     Observation::new("Austria", 2020, 35.0),
/// ]);
/// let options = RankingOptions {
///     top_n: NonZeroUsize::new(2).expect("non-zero"),
///     top_tier_size: 1,
///     spotlight: Some(EntityMatcher::exact("Germany")?),
///     aggregation: Aggregation::Sum,
///     backfill_top_tier: false,
/// };
/// let ranked = rank_window(&table, &PeriodWindow::all(&table), &options);
/// assert_eq!(ranked.tiers.tier_of("Germany"), Some(Tier::Spotlight));
/// assert_eq!(ranked.tiers.tier_of("Austria"), Some(Tier::Background));
/// assert_eq!(ranked.tiers.tier_of("Denmark"), None);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn rank_window(
    table: &ObservationTable,
    window: &PeriodWindow,
    options: &RankingOptions,
) -> TieredRanking {
    let mut ranking = aggregate_for_ranking(table, window, options.aggregation).ranked();
    ranking.truncate(options.top_n.get());
    let names: Vec<&str> = ranking.iter().map(|entry| entry.entity.as_str()).collect();
    let tiers = if options.backfill_top_tier {
        assign_backfilled_tiers(&names, options.top_tier_size, options.spotlight.as_ref())
    } else {
        assign_tiers(&names, options.top_tier_size, options.spotlight.as_ref())
    };
    debug!(
        "ranked {} entities over {} periods: {} top, {} spotlight, {} background",
        ranking.len(),
        window.len(),
        tiers.top_tier().len(),
        tiers.spotlight_list().len(),
        tiers.background().len()
    );
    TieredRanking { ranking, tiers }
}

/// One renderer input tuple.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesPoint {
    /// Entity label.
    pub entity: String,
    /// Reporting period.
    pub period: Period,
    /// Observed value.
    pub value: f64,
    /// Display tier of the entity.
    pub tier: Tier,
    /// Zero-based position of the entity within its tier.
    pub slot: usize,
}

/// Project the observations of tiered entities inside `window`.
///
/// Points come in draw order (top tier, spotlight, background), then by slot,
/// then by ascending period.
#[must_use]
pub fn tiered_series(
    table: &ObservationTable,
    window: &PeriodWindow,
    tiers: &TierAssignment,
) -> Vec<SeriesPoint> {
    let mut by_entity: HashMap<&str, Vec<(Period, f64)>> = HashMap::new();
    for row in table.iter().filter(|row| window.contains(row.period)) {
        by_entity
            .entry(row.entity.as_str())
            .or_default()
            .push((row.period, row.value));
    }
    let mut series = Vec::new();
    for placement in tiers.placements() {
        let Some(points) = by_entity.get_mut(placement.entity) else {
            continue;
        };
        points.sort_by_key(|(period, _)| *period);
        series.extend(points.iter().map(|(period, value)| SeriesPoint {
            entity: placement.entity.to_owned(),
            period: *period,
            value: *value,
            tier: placement.tier,
            slot: placement.slot,
        }));
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Observation;
    use rstest::{fixture, rstest};

    #[fixture]
    fn germany() -> EntityMatcher {
        EntityMatcher::exact("Germany").expect("valid matcher")
    }

    #[rstest]
    fn spotlight_inside_top_tier_is_moved_out(germany: EntityMatcher) {
        let tiers = assign_tiers(&["France", "Germany", "Italy", "Spain"], 3, Some(&germany));
        assert_eq!(tiers.top_tier(), ["France", "Italy"]);
        assert_eq!(tiers.spotlight(), Some("Germany"));
        assert_eq!(tiers.background(), ["Spain"]);
    }

    #[rstest]
    fn spotlight_in_background_is_moved_out(germany: EntityMatcher) {
        let tiers = assign_tiers(&["France", "Italy", "Spain", "Germany", "Malta"], 2, Some(&germany));
        assert_eq!(tiers.top_tier(), ["France", "Italy"]);
        assert_eq!(tiers.spotlight_list(), ["Germany"]);
        assert_eq!(tiers.background(), ["Spain", "Malta"]);
    }

    #[rstest]
    fn missing_spotlight_leaves_tiers_untouched(germany: EntityMatcher) {
        let tiers = assign_tiers(&["France", "Italy", "Spain"], 2, Some(&germany));
        assert!(tiers.spotlight_list().is_empty());
        assert_eq!(tiers.top_tier(), ["France", "Italy"]);
        assert_eq!(tiers.background(), ["Spain"]);
    }

    #[rstest]
    fn substring_spotlight_takes_first_ranked_match() {
        let matcher = EntityMatcher::substring("Germany").expect("valid matcher");
        let ranked = [
            "Belgium",
            "Germany (until 1990 former territory of the FRG)",
            "Germany",
        ];
        let tiers = assign_tiers(&ranked, 1, Some(&matcher));
        assert_eq!(
            tiers.spotlight(),
            Some("Germany (until 1990 former territory of the FRG)")
        );
        assert_eq!(tiers.background(), ["Germany"]);
    }

    #[rstest]
    fn duplicates_collapse_to_first_occurrence() {
        let tiers = assign_tiers(&["France", "France", "Italy"], 1, None);
        assert_eq!(tiers.top_tier(), ["France"]);
        assert_eq!(tiers.background(), ["Italy"]);
        assert_eq!(tiers.len(), 2);
    }

    #[rstest]
    fn zero_sized_top_tier_sends_everything_to_background() {
        let tiers = assign_tiers(&["France", "Italy"], 0, None);
        assert!(tiers.top_tier().is_empty());
        assert_eq!(tiers.background(), ["France", "Italy"]);
    }

    #[rstest]
    fn placements_follow_draw_order(germany: EntityMatcher) {
        let tiers = assign_tiers(&["France", "Germany", "Italy", "Spain", "Malta"], 2, Some(&germany));
        let order: Vec<_> = tiers
            .placements()
            .map(|placement| (placement.entity, placement.tier, placement.slot))
            .collect();
        assert_eq!(
            order,
            vec![
                ("France", Tier::Top, 0),
                ("Germany", Tier::Spotlight, 0),
                ("Italy", Tier::Background, 0),
                ("Spain", Tier::Background, 1),
                ("Malta", Tier::Background, 2),
            ]
        );
    }

    #[fixture]
    fn recycling() -> ObservationTable {
        ObservationTable::from_rows([
            Observation::new("Slovenia", 2021, 60.0),
            Observation::new("Germany", 2021, 67.0),
            Observation::new("Austria", 2021, 62.0),
            Observation::new("Malta", 2021, 11.0),
            Observation::new("Germany", 2020, 66.0),
            Observation::new("Slovenia", 2020, 59.0),
            Observation::new("Austria", 2019, 58.0),
            Observation::new("Malta", 2020, 10.0),
        ])
    }

    #[rstest]
    fn rank_window_truncates_before_tiering(recycling: ObservationTable, germany: EntityMatcher) {
        let window = PeriodWindow::from_periods([Period::new(2020), Period::new(2021)]);
        let options = RankingOptions {
            top_n: NonZeroUsize::new(2).expect("non-zero"),
            top_tier_size: 1,
            spotlight: Some(germany),
            aggregation: Aggregation::Sum,
            backfill_top_tier: false,
        };
        let ranked = rank_window(&recycling, &window, &options);
        let names: Vec<_> = ranked.ranking.iter().map(|e| e.entity.as_str()).collect();
        assert_eq!(names, vec!["Germany", "Slovenia"]);
        assert!(ranked.tiers.top_tier().is_empty());
        assert_eq!(ranked.tiers.spotlight(), Some("Germany"));
        assert_eq!(ranked.tiers.background(), ["Slovenia"]);
    }

    #[rstest]
    fn backfill_promotes_the_next_ranked_entity(germany: EntityMatcher) {
        let tiers = assign_backfilled_tiers(&["Germany", "Austria", "Slovenia", "Malta"], 2, Some(&germany));
        assert_eq!(tiers.top_tier(), ["Austria", "Slovenia"]);
        assert_eq!(tiers.spotlight(), Some("Germany"));
        assert_eq!(tiers.background(), ["Malta"]);
    }

    #[rstest]
    fn backfill_matches_fixed_split_when_spotlight_is_outside_the_top(germany: EntityMatcher) {
        let ranked = ["France", "Italy", "Spain", "Germany", "Malta"];
        assert_eq!(
            assign_backfilled_tiers(&ranked, 2, Some(&germany)),
            assign_tiers(&ranked, 2, Some(&germany))
        );
    }

    #[rstest]
    fn rank_window_honours_backfill(recycling: ObservationTable, germany: EntityMatcher) {
        let window = PeriodWindow::from_periods([Period::new(2021)]);
        let options = RankingOptions {
            top_n: NonZeroUsize::new(10).expect("non-zero"),
            top_tier_size: 2,
            spotlight: Some(germany),
            aggregation: Aggregation::Sum,
            backfill_top_tier: true,
        };
        let ranked = rank_window(&recycling, &window, &options);
        assert_eq!(ranked.tiers.top_tier(), ["Austria", "Slovenia"]);
        assert_eq!(ranked.tiers.spotlight(), Some("Germany"));
        assert_eq!(ranked.tiers.background(), ["Malta"]);
    }

    #[rstest]
    fn series_follow_tier_then_period_order(recycling: ObservationTable) {
        let window = PeriodWindow::all(&recycling);
        let tiers = assign_tiers(&["Germany", "Austria"], 1, None);
        let points: Vec<_> = tiered_series(&recycling, &window, &tiers)
            .into_iter()
            .map(|point| (point.entity, point.period.year(), point.tier))
            .collect();
        assert_eq!(
            points,
            vec![
                ("Germany".to_owned(), 2020, Tier::Top),
                ("Germany".to_owned(), 2021, Tier::Top),
                ("Austria".to_owned(), 2019, Tier::Background),
                ("Austria".to_owned(), 2021, Tier::Background),
            ]
        );
    }

    #[rstest]
    fn series_skip_periods_outside_the_window(recycling: ObservationTable) {
        let window = PeriodWindow::from_periods([Period::new(2021)]);
        let tiers = assign_tiers(&["Austria"], 1, None);
        let series = tiered_series(&recycling, &window, &tiers);
        assert_eq!(series.len(), 1);
        assert_eq!(series.first().map(|p| p.period), Some(Period::new(2021)));
    }
}
