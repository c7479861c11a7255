//! Bookkeeping for rows dropped during ingestion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a row was left out of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The entity cell was empty.
    BlankEntity,
    /// The period was not an integer year.
    InvalidPeriod,
    /// The value cell was empty or `:`.
    MissingValue,
    /// The value did not parse as a number.
    NonNumericValue,
    /// The value parsed to NaN or infinity.
    NonFiniteValue,
    /// The record was not valid UTF-8.
    InvalidEncoding,
}

impl SkipReason {
    /// Short label used in log summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlankEntity => "blank entity",
            Self::InvalidPeriod => "invalid period",
            Self::MissingValue => "missing value",
            Self::NonNumericValue => "non-numeric value",
            Self::NonFiniteValue => "non-finite value",
            Self::InvalidEncoding => "invalid encoding",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-reason counts of skipped rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRows {
    /// Rows with an empty entity.
    pub blank_entity: usize,
    /// Rows whose period was not integer-like.
    pub invalid_period: usize,
    /// Rows without a value.
    pub missing_value: usize,
    /// Rows whose value was not a number.
    pub non_numeric_value: usize,
    /// Rows whose value was NaN or infinite.
    pub non_finite_value: usize,
    /// Rows that were not valid UTF-8.
    pub invalid_encoding: usize,
}

impl SkippedRows {
    /// Count one skipped row.
    pub const fn record(&mut self, reason: SkipReason) {
        let counter = self.counter_mut(reason);
        *counter = counter.saturating_add(1);
    }

    /// Rows skipped for `reason`.
    #[must_use]
    pub const fn count(&self, reason: SkipReason) -> usize {
        match reason {
            SkipReason::BlankEntity => self.blank_entity,
            SkipReason::InvalidPeriod => self.invalid_period,
            SkipReason::MissingValue => self.missing_value,
            SkipReason::NonNumericValue => self.non_numeric_value,
            SkipReason::NonFiniteValue => self.non_finite_value,
            SkipReason::InvalidEncoding => self.invalid_encoding,
        }
    }

    /// Rows skipped for any reason.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.blank_entity
            .saturating_add(self.invalid_period)
            .saturating_add(self.missing_value)
            .saturating_add(self.non_numeric_value)
            .saturating_add(self.non_finite_value)
            .saturating_add(self.invalid_encoding)
    }

    const fn counter_mut(&mut self, reason: SkipReason) -> &mut usize {
        match reason {
            SkipReason::BlankEntity => &mut self.blank_entity,
            SkipReason::InvalidPeriod => &mut self.invalid_period,
            SkipReason::MissingValue => &mut self.missing_value,
            SkipReason::NonNumericValue => &mut self.non_numeric_value,
            SkipReason::NonFiniteValue => &mut self.non_finite_value,
            SkipReason::InvalidEncoding => &mut self.invalid_encoding,
        }
    }
}

const REASONS: [SkipReason; 6] = [
    SkipReason::BlankEntity,
    SkipReason::InvalidPeriod,
    SkipReason::MissingValue,
    SkipReason::NonNumericValue,
    SkipReason::NonFiniteValue,
    SkipReason::InvalidEncoding,
];

impl fmt::Display for SkippedRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for reason in REASONS {
            let count = self.count(reason);
            if count == 0 {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{count} {reason}")?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn summary_lists_only_non_zero_reasons() {
        let mut skipped = SkippedRows::default();
        skipped.record(SkipReason::MissingValue);
        skipped.record(SkipReason::MissingValue);
        skipped.record(SkipReason::BlankEntity);
        assert_eq!(skipped.total(), 3);
        assert_eq!(skipped.to_string(), "1 blank entity, 2 missing value");
    }

    #[rstest]
    fn empty_summary_reads_none() {
        assert_eq!(SkippedRows::default().to_string(), "none");
    }
}
