//! Long-format observations and the in-memory table they live in.
//!
//! A table keeps rows in the order they were supplied. Ranking code relies on
//! that order to break ties, so nothing in this module reorders rows.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use log::debug;

use crate::EntityMatcher;

/// A reporting period, typically a calendar year.
///
/// # Examples
/// ```
/// use loopstat_core::Period;
///
/// let period = Period::new(2021);
/// assert_eq!(period.year(), 2021);
/// assert!(Period::new(2020) < period);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Period(i32);

impl Period {
    /// Wrap a year.
    #[must_use]
    pub const fn new(year: i32) -> Self {
        Self(year)
    }

    /// Return the wrapped year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.0
    }
}

impl From<i32> for Period {
    fn from(year: i32) -> Self {
        Self(year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `(entity, period, value)` data point.
///
/// # Examples
/// ```
/// use loopstat_core::{Observation, Period};
///
/// let row = Observation::new("Germany", 2020, 632.5);
/// assert_eq!(row.entity, "Germany");
/// assert_eq!(row.period, Period::new(2020));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// Country or region label.
    pub entity: String,
    /// Reporting period.
    pub period: Period,
    /// Observed value.
    pub value: f64,
}

impl Observation {
    /// Construct an observation.
    pub fn new(entity: impl Into<String>, period: impl Into<Period>, value: f64) -> Self {
        Self {
            entity: entity.into(),
            period: period.into(),
            value,
        }
    }
}

/// Row filters applied before any selection.
///
/// # Examples
/// ```
/// use loopstat_core::{EntityMatcher, Observation, Period, TableFilter};
///
/// # fn main() -> Result<(), loopstat_core::MatcherError> {
/// let filter = TableFilter::default()
///     .excluding(EntityMatcher::substring("European Union")?)
///     .since(Period::new(2003));
/// assert!(filter.allows(&Observation::new("Belgium", 2010, 70.1)));
/// assert!(!filter.allows(&Observation::new("European Union - 27 countries", 2010, 23.0)));
/// assert!(!filter.allows(&Observation::new("Belgium", 2001, 68.0)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableFilter {
    /// Entities dropped from the table.
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclude: Vec<EntityMatcher>,
    /// Earliest period kept, inclusive.
    #[cfg_attr(feature = "serde", serde(default))]
    pub since: Option<Period>,
}

impl TableFilter {
    /// Add an exclusion while returning `self` for chaining.
    #[must_use]
    pub fn excluding(mut self, matcher: EntityMatcher) -> Self {
        self.exclude.push(matcher);
        self
    }

    /// Keep only periods at or after `period`.
    #[must_use]
    pub const fn since(mut self, period: Period) -> Self {
        self.since = Some(period);
        self
    }

    /// Report whether the filter keeps `row`.
    #[must_use]
    pub fn allows(&self, row: &Observation) -> bool {
        let recent_enough = self.since.is_none_or(|earliest| row.period >= earliest);
        recent_enough && !self.exclude.iter().any(|m| m.matches(&row.entity))
    }

    /// Report whether the filter keeps every row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exclude.is_empty() && self.since.is_none()
    }
}

/// An ordered collection of observations.
///
/// Rows with a non-finite value are dropped on construction; every other row
/// is kept in input order.
///
/// # Examples
/// ```
/// use loopstat_core::{Observation, ObservationTable, Period};
///
/// let table = ObservationTable::from_rows([
///     Observation::new("A", 2020, 5.0),
///     Observation::new("B", 2021, f64::NAN),
/// ]);
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.latest_period(), Some(Period::new(2020)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ObservationTable {
    rows: Vec<Observation>,
}

impl ObservationTable {
    /// Build a table, discarding rows whose value is NaN or infinite.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut dropped = 0_usize;
        let kept: Vec<Observation> = rows
            .into_iter()
            .filter(|row| {
                let finite = row.value.is_finite();
                if !finite {
                    dropped = dropped.saturating_add(1);
                }
                finite
            })
            .collect();
        if dropped > 0 {
            debug!("dropped {dropped} observations with non-finite values");
        }
        Self { rows: kept }
    }

    /// Borrow the rows in input order.
    #[must_use]
    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    /// Iterate over the rows in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.rows.iter()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Report whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct periods present, ascending.
    #[must_use]
    pub fn periods(&self) -> Vec<Period> {
        self.rows
            .iter()
            .map(|row| row.period)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The largest period present.
    #[must_use]
    pub fn latest_period(&self) -> Option<Period> {
        self.rows.iter().map(|row| row.period).max()
    }

    /// Distinct entities in order of first appearance.
    #[must_use]
    pub fn entities(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|row| row.entity.as_str())
            .filter(|entity| seen.insert(*entity))
            .collect()
    }

    /// Return a copy holding only the rows `filter` allows.
    #[must_use]
    pub fn filtered(&self, filter: &TableFilter) -> Self {
        if filter.is_empty() {
            return self.clone();
        }
        let rows: Vec<Observation> = self
            .rows
            .iter()
            .filter(|row| filter.allows(row))
            .cloned()
            .collect();
        debug!(
            "table filter kept {} of {} observations",
            rows.len(),
            self.rows.len()
        );
        Self { rows }
    }
}

impl FromIterator<Observation> for ObservationTable {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self::from_rows(iter)
    }
}

impl<'a> IntoIterator for &'a ObservationTable {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
