//! The `dashboard` subcommand: render every panel of a catalogue.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use loopstat_data::{IndicatorCatalog, IndicatorDefinition, IndicatorView, render_indicator};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::{write_json, write_json_file};
use crate::{
    ARG_CATALOG, ARG_DATA_DIR, ARG_INDICATOR, ARG_OUTPUT_DIR, CliError, require_existing,
};

/// CLI arguments for the `dashboard` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Render the panels of an indicator catalogue. Without \
                 --catalog the built-in circular economy dashboard is used, \
                 reading Eurostat extracts from --data-dir. Views go to \
                 stdout as a JSON array, or to one <id>.json file per panel \
                 under --output-dir.",
    about = "Render every panel of an indicator catalogue"
)]
#[ortho_config(prefix = "LOOPSTAT")]
pub(crate) struct DashboardArgs {
    /// Directory holding the data files named by the catalogue.
    #[arg(long = ARG_DATA_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) data_dir: Option<Utf8PathBuf>,
    /// JSON catalogue replacing the built-in dashboard.
    #[arg(long = ARG_CATALOG, value_name = "path")]
    #[serde(default)]
    pub(crate) catalog: Option<Utf8PathBuf>,
    /// Write one JSON file per panel here instead of stdout.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Render only this indicator; repeat for several.
    #[arg(long = ARG_INDICATOR, value_name = "id")]
    #[serde(default)]
    pub(crate) indicator: Vec<String>,
}

impl DashboardArgs {
    pub(crate) fn into_config(self) -> Result<DashboardConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(DashboardConfig::from(merged))
    }
}

/// Resolved `dashboard` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DashboardConfig {
    /// Directory the catalogue's file names are relative to.
    pub(crate) data_dir: Utf8PathBuf,
    /// Catalogue file; `None` selects the built-in dashboard.
    pub(crate) catalog: Option<Utf8PathBuf>,
    /// Destination directory; `None` prints to stdout.
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Indicator ids to render; empty renders all.
    pub(crate) indicators: Vec<String>,
}

impl From<DashboardArgs> for DashboardConfig {
    fn from(args: DashboardArgs) -> Self {
        Self {
            data_dir: args.data_dir.unwrap_or_else(|| Utf8PathBuf::from(".")),
            catalog: args.catalog,
            output_dir: args.output_dir,
            indicators: args.indicator,
        }
    }
}

impl DashboardConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_data_dir(&self.data_dir)?;
        if let Some(catalog) = &self.catalog {
            require_existing(catalog, ARG_CATALOG)?;
        }
        if let Some(output_dir) = &self.output_dir {
            Self::require_output_dir(output_dir)?;
        }
        Ok(())
    }

    fn require_data_dir(path: &Utf8Path) -> Result<(), CliError> {
        match loopstat_fs::dir_is_dir(path) {
            Ok(true) => Ok(()),
            Err(source) if source.kind() != std::io::ErrorKind::NotFound => {
                Err(CliError::InspectSourcePath {
                    field: ARG_DATA_DIR,
                    path: path.to_path_buf(),
                    source,
                })
            }
            Ok(false) | Err(_) => Err(CliError::DataDirectoryNotDirectory {
                path: path.to_path_buf(),
            }),
        }
    }

    /// The output directory may be absent; it is created on first write.
    fn require_output_dir(path: &Utf8Path) -> Result<(), CliError> {
        match loopstat_fs::dir_is_dir(path) {
            Ok(true) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Ok(false) => Err(CliError::OutputDirectoryNotDirectory {
                path: path.to_path_buf(),
            }),
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_OUTPUT_DIR,
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn load_catalog(&self) -> Result<IndicatorCatalog, CliError> {
        match &self.catalog {
            Some(path) => Ok(IndicatorCatalog::load(path)?),
            None => Ok(IndicatorCatalog::circular_economy()),
        }
    }

    /// Pick the requested definitions, preserving catalogue order.
    fn selected<'a>(
        &self,
        catalog: &'a IndicatorCatalog,
    ) -> Result<Vec<&'a IndicatorDefinition>, CliError> {
        if let Some(unknown) = self
            .indicators
            .iter()
            .find(|id| catalog.get(id.as_str()).is_none())
        {
            return Err(CliError::UnknownIndicator {
                id: unknown.clone(),
            });
        }
        Ok(catalog
            .iter()
            .filter(|definition| {
                self.indicators.is_empty() || self.indicators.contains(&definition.id)
            })
            .collect())
    }
}

pub(crate) fn run_dashboard_with(
    args: DashboardArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    render_dashboard(&config, writer)
}

pub(crate) fn render_dashboard(
    config: &DashboardConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    config.validate_sources()?;
    let catalog = config.load_catalog()?;
    let views = config
        .selected(&catalog)?
        .into_iter()
        .map(|definition| render_indicator(&config.data_dir, definition))
        .collect::<Result<Vec<IndicatorView>, _>>()?;
    match &config.output_dir {
        Some(dir) => {
            for view in &views {
                write_json_file(&dir.join(format!("{}.json", view.id)), view)?;
            }
            info!("rendered {} panels into {dir}", views.len());
            Ok(())
        }
        None => write_json(writer, &views),
    }
}

#[cfg(test)]
pub(crate) fn dashboard_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<DashboardConfig, CliError> {
    let merged = DashboardArgs::merge_from_layers(layers).map_err(CliError::from)?;
    Ok(DashboardConfig::from(merged))
}
