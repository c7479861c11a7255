//! Column mapping and entity renames applied while reading rows.

use std::collections::BTreeMap;

use csv::StringRecord;
use loopstat_core::{Observation, Period};
use serde::{Deserialize, Serialize};

use super::SkipReason;

/// Byte-order mark Excel and the Eurostat bulk download prepend to CSV files.
const BOM: char = '\u{feff}';

/// Names of the columns holding entity, period and value.
///
/// # Examples
/// ```
/// use loopstat_data::ColumnMapping;
///
/// let columns = ColumnMapping::eurostat();
/// assert_eq!(columns.period, "TIME_PERIOD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Entity label column.
    pub entity: String,
    /// Period column.
    pub period: String,
    /// Observed value column.
    pub value: String,
}

impl ColumnMapping {
    /// Columns of a Eurostat SDMX-CSV extract with labels.
    #[must_use]
    pub fn eurostat() -> Self {
        Self {
            entity: "Geopolitical entity (reporting)".to_owned(),
            period: "TIME_PERIOD".to_owned(),
            value: "OBS_VALUE".to_owned(),
        }
    }

    /// Find the mapped columns in `headers`, or name the first one missing.
    pub(super) fn locate(&self, headers: &StringRecord) -> Result<ColumnIndices, String> {
        let position = |wanted: &str| {
            headers
                .iter()
                .position(|header| header.trim_start_matches(BOM) == wanted)
                .ok_or_else(|| wanted.to_owned())
        };
        Ok(ColumnIndices {
            entity: position(&self.entity)?,
            period: position(&self.period)?,
            value: position(&self.value)?,
        })
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::eurostat()
    }
}

/// Resolved column positions for one file.
#[derive(Debug, Clone, Copy)]
pub(super) struct ColumnIndices {
    entity: usize,
    period: usize,
    value: usize,
}

impl ColumnIndices {
    /// Turn one record into an observation, or explain why it was skipped.
    pub(super) fn observation(
        self,
        record: &StringRecord,
        aliases: &EntityAliases,
    ) -> Result<Observation, SkipReason> {
        let entity = record.get(self.entity).unwrap_or_default();
        if entity.is_empty() {
            return Err(SkipReason::BlankEntity);
        }
        let period = record
            .get(self.period)
            .and_then(parse_period)
            .ok_or(SkipReason::InvalidPeriod)?;
        let value = parse_value(record.get(self.value).unwrap_or_default())?;
        Ok(Observation::new(aliases.resolve(entity), period, value))
    }
}

/// Accept `2020` and the float rendering `2020.0` some exports use.
fn parse_period(raw: &str) -> Option<Period> {
    if let Ok(year) = raw.parse::<i32>() {
        return Some(Period::new(year));
    }
    let (whole, fraction) = raw.split_once('.')?;
    if fraction.bytes().all(|digit| digit == b'0') {
        whole.parse::<i32>().ok().map(Period::new)
    } else {
        None
    }
}

/// Eurostat marks unavailable cells with `:`.
fn parse_value(raw: &str) -> Result<f64, SkipReason> {
    if raw.is_empty() || raw == ":" {
        return Err(SkipReason::MissingValue);
    }
    let value: f64 = raw.parse().map_err(|_| SkipReason::NonNumericValue)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SkipReason::NonFiniteValue)
    }
}

/// Entity renames applied while ingesting.
///
/// # Examples
/// ```
/// use loopstat_data::EntityAliases;
///
/// let aliases = EntityAliases::eurostat_short_names();
/// assert_eq!(aliases.resolve("Czechia"), "Czech Republic");
/// assert_eq!(aliases.resolve("Austria"), "Austria");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityAliases {
    renames: BTreeMap<String, String>,
}

impl EntityAliases {
    /// Add a rename while returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.insert(from.into(), to.into());
        self
    }

    /// Renames matching the labels map renderers expect.
    #[must_use]
    pub fn eurostat_short_names() -> Self {
        Self::default()
            .with("Czechia", "Czech Republic")
            .with("EU27_2020", "European Union")
    }

    /// The replacement for `entity`, or `entity` itself.
    #[must_use]
    pub fn resolve<'a>(&'a self, entity: &'a str) -> &'a str {
        self.renames.get(entity).map_or(entity, String::as_str)
    }

    /// Report whether no renames are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}
