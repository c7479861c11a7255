//! The `frames`, `trend` and `snapshot` subcommands.
//!
//! All three read one data file, apply a row filter and print a single
//! [`View`] as JSON. They differ only in the recipe they build.

use std::io::Write;
use std::num::NonZeroUsize;

use camino::Utf8PathBuf;
use clap::Parser;
use log::debug;
use loopstat_core::{
    Aggregation, EntityMatcher, FramesSpec, MatcherError, Period, TableFilter, TrendSpec, View,
    ViewSpec, build_view,
};
use loopstat_data::{IngestOptions, read_observations};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::write_json;
use crate::{
    ARG_AGGREGATION, ARG_BACKFILL_TOP_TIER, ARG_EXCLUDE, ARG_EXCLUDE_CONTAINING, ARG_INPUT,
    ARG_SINCE, ARG_SPOTLIGHT, ARG_SPOTLIGHT_CONTAINING, ARG_TOP_N, ARG_TOP_TIER, ARG_WINDOW,
    CliError, DEFAULT_TOP_N, DEFAULT_TOP_TIER, DEFAULT_WINDOW, ENV_FRAMES_INPUT,
    ENV_SNAPSHOT_INPUT, ENV_TREND_INPUT, require_existing,
};

/// CLI arguments for the `frames` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank the top entities in each of the most recent periods. \
                 Each period is ranked on its own, so membership changes \
                 from frame to frame.",
    about = "Rank the top entities independently in each recent period"
)]
#[ortho_config(prefix = "LOOPSTAT")]
pub(crate) struct FramesArgs {
    /// Long-format CSV file with entity, period and value columns.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Number of most recent periods to keep (default 20).
    #[arg(long = ARG_WINDOW, value_name = "periods")]
    #[serde(default)]
    pub(crate) window: Option<usize>,
    /// Entities ranked per period (default 10).
    #[arg(long = ARG_TOP_N, value_name = "count")]
    #[serde(default)]
    pub(crate) top_n: Option<usize>,
    /// Drop the entity with exactly this name.
    #[arg(long = ARG_EXCLUDE, value_name = "name")]
    #[serde(default)]
    pub(crate) exclude: Vec<String>,
    /// Drop every entity whose name contains this fragment.
    #[arg(long = ARG_EXCLUDE_CONTAINING, value_name = "fragment")]
    #[serde(default)]
    pub(crate) exclude_containing: Vec<String>,
    /// Drop periods before this year.
    #[arg(long = ARG_SINCE, value_name = "year")]
    #[serde(default)]
    pub(crate) since: Option<i32>,
}

/// CLI arguments for the `trend` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Aggregate each entity over the most recent periods, keep \
                 the leaders, and split them into a top tier, an optional \
                 spotlight, and a muted background for trend plots.",
    about = "Rank entities over a window and split them into tiers"
)]
#[ortho_config(prefix = "LOOPSTAT")]
pub(crate) struct TrendArgs {
    /// Long-format CSV file with entity, period and value columns.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Number of most recent periods to aggregate (default 20).
    #[arg(long = ARG_WINDOW, value_name = "periods")]
    #[serde(default)]
    pub(crate) window: Option<usize>,
    /// Entities kept from the aggregate ranking (default 10).
    #[arg(long = ARG_TOP_N, value_name = "count")]
    #[serde(default)]
    pub(crate) top_n: Option<usize>,
    /// Leading ranks drawn as the top tier (default 3).
    #[arg(long = ARG_TOP_TIER, value_name = "count")]
    #[serde(default)]
    pub(crate) top_tier: Option<usize>,
    /// Refill the top tier when the spotlight ranks inside it.
    #[arg(long = ARG_BACKFILL_TOP_TIER)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) backfill_top_tier: bool,
    /// Spotlight the entity with exactly this name.
    #[arg(long = ARG_SPOTLIGHT, value_name = "name")]
    #[serde(default)]
    pub(crate) spotlight: Option<String>,
    /// Spotlight the first entity whose name contains this fragment.
    #[arg(long = ARG_SPOTLIGHT_CONTAINING, value_name = "fragment")]
    #[serde(default)]
    pub(crate) spotlight_containing: Option<String>,
    /// How values are folded across the window: sum or mean.
    #[arg(long = ARG_AGGREGATION, value_name = "sum|mean")]
    #[serde(default)]
    pub(crate) aggregation: Option<Aggregation>,
    /// Drop the entity with exactly this name.
    #[arg(long = ARG_EXCLUDE, value_name = "name")]
    #[serde(default)]
    pub(crate) exclude: Vec<String>,
    /// Drop every entity whose name contains this fragment.
    #[arg(long = ARG_EXCLUDE_CONTAINING, value_name = "fragment")]
    #[serde(default)]
    pub(crate) exclude_containing: Vec<String>,
    /// Drop periods before this year.
    #[arg(long = ARG_SINCE, value_name = "year")]
    #[serde(default)]
    pub(crate) since: Option<i32>,
}

/// CLI arguments for the `snapshot` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "List every entity reporting in the latest period, \
                 unranked, for choropleth maps.",
    about = "Show every entity at the latest period"
)]
#[ortho_config(prefix = "LOOPSTAT")]
pub(crate) struct SnapshotArgs {
    /// Long-format CSV file with entity, period and value columns.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Drop the entity with exactly this name.
    #[arg(long = ARG_EXCLUDE, value_name = "name")]
    #[serde(default)]
    pub(crate) exclude: Vec<String>,
    /// Drop every entity whose name contains this fragment.
    #[arg(long = ARG_EXCLUDE_CONTAINING, value_name = "fragment")]
    #[serde(default)]
    pub(crate) exclude_containing: Vec<String>,
}

impl FramesArgs {
    pub(crate) fn into_config(self) -> Result<ViewConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ViewConfig::try_from(merged)
    }
}

impl TrendArgs {
    pub(crate) fn into_config(self) -> Result<ViewConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ViewConfig::try_from(merged)
    }
}

impl SnapshotArgs {
    pub(crate) fn into_config(self) -> Result<ViewConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ViewConfig::try_from(merged)
    }
}

/// Resolved configuration shared by the single-view subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ViewConfig {
    /// Data file to read.
    pub(crate) input: Utf8PathBuf,
    /// Recipe applied to the filtered table.
    pub(crate) spec: ViewSpec,
    /// Rows removed before selection.
    pub(crate) filter: TableFilter,
}

impl ViewConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.input, ARG_INPUT)
    }
}

impl TryFrom<FramesArgs> for ViewConfig {
    type Error = CliError;

    fn try_from(args: FramesArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_FRAMES_INPUT,
        })?;
        let spec = ViewSpec::RankedFrames(FramesSpec {
            window: Some(count_or(args.window, DEFAULT_WINDOW, ARG_WINDOW)?),
            top_n: count_or(args.top_n, DEFAULT_TOP_N, ARG_TOP_N)?,
        });
        let filter = table_filter(args.exclude, args.exclude_containing, args.since)?;
        Ok(Self {
            input,
            spec,
            filter,
        })
    }
}

impl TryFrom<TrendArgs> for ViewConfig {
    type Error = CliError;

    fn try_from(args: TrendArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_TREND_INPUT,
        })?;
        let spotlight = spotlight(args.spotlight, args.spotlight_containing)?;
        let spec = ViewSpec::TieredTrend(TrendSpec {
            window: count_or(args.window, DEFAULT_WINDOW, ARG_WINDOW)?,
            top_n: count_or(args.top_n, DEFAULT_TOP_N, ARG_TOP_N)?,
            top_tier_size: args.top_tier.unwrap_or(DEFAULT_TOP_TIER),
            spotlight,
            aggregation: args.aggregation.unwrap_or_default(),
            backfill_top_tier: args.backfill_top_tier,
        });
        let filter = table_filter(args.exclude, args.exclude_containing, args.since)?;
        Ok(Self {
            input,
            spec,
            filter,
        })
    }
}

impl TryFrom<SnapshotArgs> for ViewConfig {
    type Error = CliError;

    fn try_from(args: SnapshotArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_SNAPSHOT_INPUT,
        })?;
        let filter = table_filter(args.exclude, args.exclude_containing, None)?;
        Ok(Self {
            input,
            spec: ViewSpec::LatestSnapshot,
            filter,
        })
    }
}

fn count_or(
    value: Option<usize>,
    default: usize,
    field: &'static str,
) -> Result<NonZeroUsize, CliError> {
    NonZeroUsize::new(value.unwrap_or(default)).ok_or(CliError::ZeroCount { field })
}

fn matcher(
    pattern: String,
    build: fn(String) -> Result<EntityMatcher, MatcherError>,
    field: &'static str,
) -> Result<EntityMatcher, CliError> {
    build(pattern).map_err(|source| CliError::InvalidMatcher { field, source })
}

fn spotlight(
    exact: Option<String>,
    containing: Option<String>,
) -> Result<Option<EntityMatcher>, CliError> {
    match (exact, containing) {
        (Some(_), Some(_)) => Err(CliError::ConflictingArguments {
            first: ARG_SPOTLIGHT,
            second: ARG_SPOTLIGHT_CONTAINING,
        }),
        (Some(name), None) => matcher(name, EntityMatcher::exact, ARG_SPOTLIGHT).map(Some),
        (None, Some(fragment)) => {
            matcher(fragment, EntityMatcher::substring, ARG_SPOTLIGHT_CONTAINING).map(Some)
        }
        (None, None) => Ok(None),
    }
}

fn table_filter(
    exclude: Vec<String>,
    exclude_containing: Vec<String>,
    since: Option<i32>,
) -> Result<TableFilter, CliError> {
    let exact = exclude
        .into_iter()
        .map(|name| matcher(name, EntityMatcher::exact, ARG_EXCLUDE));
    let loose = exclude_containing
        .into_iter()
        .map(|fragment| matcher(fragment, EntityMatcher::substring, ARG_EXCLUDE_CONTAINING));
    let mut filter = exact
        .chain(loose)
        .try_fold(TableFilter::default(), |filter, next| {
            next.map(|m| filter.excluding(m))
        })?;
    if let Some(year) = since {
        filter = filter.since(Period::new(year));
    }
    Ok(filter)
}

pub(crate) fn run_view_with(config: ViewConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    let view = execute_view(&config)?;
    write_json(writer, &view)
}

fn execute_view(config: &ViewConfig) -> Result<View, CliError> {
    config.validate_sources()?;
    let report = read_observations(&config.input, &IngestOptions::default())?;
    debug!(
        "read {} observations from {}",
        report.table.len(),
        config.input
    );
    Ok(build_view(&report.table, &config.spec, &config.filter))
}

#[cfg(test)]
pub(crate) fn trend_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ViewConfig, CliError> {
    let merged = TrendArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ViewConfig::try_from(merged)
}
