//! Test-only, in-memory `ObservationSource` implementation and sample data
//! used by unit and behaviour tests.

use std::convert::Infallible;

use crate::{Observation, ObservationSource, ObservationTable};

/// In-memory `ObservationSource` returning a fixed table.
#[derive(Default, Debug, Clone)]
pub struct MemorySource {
    table: ObservationTable,
}

impl MemorySource {
    /// Create a source from a collection of observations.
    pub fn with_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Observation>,
    {
        Self {
            table: ObservationTable::from_rows(rows),
        }
    }
}

impl ObservationSource for MemorySource {
    type Error = Infallible;

    fn load(&self) -> Result<ObservationTable, Self::Error> {
        Ok(self.table.clone())
    }
}

/// Recycling rates for four countries over three years.
///
/// Summed over all three years the ranking is France, Germany, Italy, Spain.
#[must_use]
pub fn recycling_rates() -> ObservationTable {
    let rows = [
        ("France", [40.0, 41.0, 42.0]),
        ("Germany", [38.0, 39.0, 40.0]),
        ("Italy", [30.0, 31.0, 33.0]),
        ("Spain", [20.0, 22.0, 21.0]),
    ];
    rows.into_iter()
        .flat_map(|(entity, values)| {
            (2019..).zip(values).map(move |(year, value)| Observation::new(entity, year, value))
        })
        .collect()
}
