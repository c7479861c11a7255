//! Loading observation tables.
//!
//! Selection code only ever sees an [`ObservationTable`]; where the rows come
//! from is the business of an [`ObservationSource`] implementation.

use crate::ObservationTable;

/// Read-only access to a table of observations.
///
/// Implementations must return rows in a stable order: ranking ties are
/// broken by row order, so two loads of unchanged data must agree.
///
/// # Examples
/// ```
/// use std::convert::Infallible;
/// use loopstat_core::{Observation, ObservationSource, ObservationTable};
///
/// struct Fixed;
///
/// impl ObservationSource for Fixed {
///     type Error = Infallible;
///
///     fn load(&self) -> Result<ObservationTable, Self::Error> {
///         Ok(ObservationTable::from_rows([Observation::new("Austria", 2021, 7.5)]))
///     }
/// }
///
/// let table = Fixed.load().expect("infallible");
/// assert_eq!(table.len(), 1);
/// ```
pub trait ObservationSource: Send + Sync {
    /// Failure raised while loading.
    type Error;

    /// Load every observation the source holds.
    ///
    /// # Errors
    /// Returns the implementation's error when the rows cannot be read.
    fn load(&self) -> Result<ObservationTable, Self::Error>;
}
