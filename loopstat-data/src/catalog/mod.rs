//! Indicator catalogues: which file feeds which dashboard panel.
//!
//! A catalogue is a list of [`IndicatorDefinition`] values, either the
//! built-in circular economy dashboard or a JSON file of the same shape:
//!
//! ```json
//! {
//!   "indicators": [
//!     {
//!       "id": "municipal-recycling",
//!       "title": "Recycling rate of municipal waste",
//!       "file": "Recycling_rate_of_municipal_waste.csv",
//!       "filter": { "exclude": [{ "exact": "European Union - 27 countries (from 2020)" }] },
//!       "view": {
//!         "kind": "tiered_trend",
//!         "window": 10,
//!         "top_n": 10,
//!         "top_tier_size": 2,
//!         "spotlight": { "exact": "Germany" },
//!         "backfill_top_tier": true
//!       }
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::io::Read;
use std::num::NonZeroUsize;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use loopstat_core::{
    Aggregation, EntityMatcher, FramesSpec, Period, TableFilter, TrendSpec, View, ViewSpec,
    build_view,
};
use loopstat_fs::open_utf8_file;
use serde::{Deserialize, Serialize};

use crate::ingest::{
    ColumnMapping, EntityAliases, IngestError, IngestOptions, SkippedRows, read_observations,
};

/// The aggregate row Eurostat adds to most extracts.
const EU27_2020: &str = "European Union - 27 countries (from 2020)";

/// One dashboard panel: its data file and how to present it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    /// Stable identifier, also used as the output file stem.
    pub id: String,
    /// Human-readable panel title.
    pub title: String,
    /// Data file, relative to the data directory.
    pub file: Utf8PathBuf,
    /// Column names in the data file.
    #[serde(default)]
    pub columns: ColumnMapping,
    /// Entity renames applied while reading.
    #[serde(default, skip_serializing_if = "EntityAliases::is_empty")]
    pub aliases: EntityAliases,
    /// Rows removed before selection.
    #[serde(default)]
    pub filter: TableFilter,
    /// Panel recipe.
    pub view: ViewSpec,
}

impl IndicatorDefinition {
    /// Options for reading [`Self::file`].
    #[must_use]
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            columns: self.columns.clone(),
            aliases: self.aliases.clone(),
            ..IngestOptions::default()
        }
    }
}

/// A rendered panel, ready to serialise for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorView {
    /// Indicator identifier.
    pub id: String,
    /// Panel title.
    pub title: String,
    /// Selected data.
    pub view: View,
    /// Rows dropped while reading the data file.
    pub skipped: SkippedRows,
}

/// An ordered set of indicator definitions with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorCatalog {
    /// Definitions in display order.
    pub indicators: Vec<IndicatorDefinition>,
}

fn count(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN)
}

fn germany() -> Option<EntityMatcher> {
    Some(EntityMatcher::Exact("Germany".to_owned()))
}

fn frames(window: Option<usize>, top_n: usize) -> ViewSpec {
    ViewSpec::RankedFrames(FramesSpec {
        window: window.map(count),
        top_n: count(top_n),
    })
}

fn trend(window: usize, top_tier_size: usize) -> TrendSpec {
    TrendSpec {
        window: count(window),
        top_n: count(10),
        top_tier_size,
        spotlight: germany(),
        aggregation: Aggregation::Sum,
        backfill_top_tier: false,
    }
}

fn indicator(id: &str, title: &str, file: &str, view: ViewSpec) -> IndicatorDefinition {
    IndicatorDefinition {
        id: id.to_owned(),
        title: title.to_owned(),
        file: Utf8PathBuf::from(file),
        columns: ColumnMapping::eurostat(),
        aliases: EntityAliases::default(),
        filter: TableFilter::default(),
        view,
    }
}

impl IndicatorCatalog {
    /// The panels of the circular economy dashboard, reading Eurostat
    /// extracts under their download names.
    #[must_use]
    pub fn circular_economy() -> Self {
        let without_eu27 =
            TableFilter::default().excluding(EntityMatcher::Exact(EU27_2020.to_owned()));
        let indicators = vec![
            indicator(
                "total-waste",
                "Top 10 waste-generating countries in Europe",
                "Total_waste_generation_per_capita.csv",
                frames(Some(20), 10),
            ),
            indicator(
                "plastic-packaging-waste",
                "Plastic packaging waste generation",
                "Generation_plastic_pkg_waste_per_capita.csv",
                ViewSpec::TieredTrend(trend(20, 3)),
            ),
            indicator(
                "plastic-packaging-recycling",
                "Plastic packaging recycling rate",
                "Recycle_Plastic_pkging.csv",
                ViewSpec::TieredTrend(trend(20, 3)),
            ),
            indicator(
                "municipal-waste",
                "Municipal waste generation per capita",
                "municipal_waste_per_capita.csv",
                ViewSpec::TieredTrend(trend(20, 3)),
            ),
            IndicatorDefinition {
                filter: without_eu27.clone(),
                ..indicator(
                    "municipal-recycling",
                    "Recycling rate of municipal waste",
                    "Recycling_rate_of_municipal_waste.csv",
                    ViewSpec::TieredTrend(TrendSpec {
                        backfill_top_tier: true,
                        ..trend(10, 2)
                    }),
                )
            },
            indicator(
                "weee-recycling",
                "Recycling rate of WEEE",
                "Recycling rate of WEEE separately collected.csv",
                ViewSpec::TieredTrend(trend(20, 3)),
            ),
            IndicatorDefinition {
                aliases: EntityAliases::eurostat_short_names(),
                ..indicator(
                    "circular-material-use",
                    "Circular material use rate by country",
                    "Circular_material_use_rate.csv",
                    ViewSpec::LatestSnapshot,
                )
            },
            IndicatorDefinition {
                filter: without_eu27,
                ..indicator(
                    "circular-material-use-frames",
                    "Top 10 countries by circular material use rate",
                    "Circular_material_use_rate.csv",
                    frames(Some(20), 10),
                )
            },
            IndicatorDefinition {
                filter: TableFilter::default()
                    .excluding(EntityMatcher::Substring("European Union".to_owned()))
                    .since(Period::new(2003)),
                ..indicator(
                    "material-import-dependency",
                    "Material import dependency",
                    "Material import dependency.csv",
                    frames(None, 10),
                )
            },
        ];
        Self { indicators }
    }

    /// Read a catalogue from a JSON file.
    ///
    /// # Errors
    /// Returns [`IngestError::ReadCatalog`] when the file cannot be read,
    /// [`IngestError::ParseCatalog`] when it is not a valid catalogue and
    /// [`IngestError::DuplicateIndicator`] when two entries share an id.
    pub fn load(path: &Utf8Path) -> Result<Self, IngestError> {
        let read_error = |source: std::io::Error| IngestError::ReadCatalog {
            path: path.to_path_buf(),
            source,
        };
        let mut contents = String::new();
        open_utf8_file(path)
            .and_then(|mut file| file.read_to_string(&mut contents))
            .map_err(read_error)?;
        let catalog: Self =
            serde_json::from_str(&contents).map_err(|source| IngestError::ParseCatalog {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(id) = catalog.first_duplicate() {
            return Err(IngestError::DuplicateIndicator {
                path: path.to_path_buf(),
                id: id.to_owned(),
            });
        }
        Ok(catalog)
    }

    /// The definition with `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&IndicatorDefinition> {
        self.indicators.iter().find(|indicator| indicator.id == id)
    }

    /// Iterate over definitions in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, IndicatorDefinition> {
        self.indicators.iter()
    }

    fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.indicators
            .iter()
            .map(|indicator| indicator.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

impl<'a> IntoIterator for &'a IndicatorCatalog {
    type Item = &'a IndicatorDefinition;
    type IntoIter = std::slice::Iter<'a, IndicatorDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.indicators.iter()
    }
}

/// Read an indicator's data file from `data_dir` and build its view.
///
/// # Errors
/// Propagates ingestion failures from [`read_observations`].
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use loopstat_data::{IndicatorCatalog, render_indicator};
///
/// # fn main() -> Result<(), loopstat_data::IngestError> {
/// let catalog = IndicatorCatalog::circular_economy();
/// for definition in &catalog {
///     let panel = render_indicator(Utf8Path::new("Dataset_CE"), definition)?;
///     println!("{}: {} rows skipped", panel.id, panel.skipped.total());
/// }
/// # Ok(())
/// # }
/// ```
pub fn render_indicator(
    data_dir: &Utf8Path,
    definition: &IndicatorDefinition,
) -> Result<IndicatorView, IngestError> {
    let path = data_dir.join(&definition.file);
    let report = read_observations(&path, &definition.ingest_options())?;
    let view = build_view(&report.table, &definition.view, &definition.filter);
    info!(
        "rendered indicator {} from {} observations",
        definition.id,
        report.table.len()
    );
    Ok(IndicatorView {
        id: definition.id.clone(),
        title: definition.title.clone(),
        view,
        skipped: report.skipped,
    })
}
