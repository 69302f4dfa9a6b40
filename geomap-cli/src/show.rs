//! `show` command: print a stored map.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geomap_core::{GeoMap, MapId};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::catalogue::{CatalogueOpener, SqliteCatalogueOpener};
use crate::{
    ARG_DATABASE, ARG_SHOW_MAP_ID, CliError, DEFAULT_DATABASE, ENV_SHOW_MAP_ID, require_existing,
    write_map,
};

/// CLI arguments for the `show` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "show", about = "Print a stored map and its regions as JSON")]
#[ortho_config(prefix = "GEOMAP")]
pub(crate) struct ShowArgs {
    /// Identity of the map to print.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) map_id: Option<i64>,
    /// Path to the SQLite catalogue (default `geomap.db`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// Resolved `show` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShowConfig {
    pub(crate) map_id: MapId,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<ShowArgs> for ShowConfig {
    type Error = CliError;

    fn try_from(args: ShowArgs) -> Result<Self, Self::Error> {
        let map_id = args.map_id.map(MapId).ok_or(CliError::MissingArgument {
            field: ARG_SHOW_MAP_ID,
            env: ENV_SHOW_MAP_ID,
        })?;
        let database = args
            .database
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE));
        Ok(Self { map_id, database })
    }
}

pub(super) fn run_show(args: ShowArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_show_with(args, &SqliteCatalogueOpener, &mut stdout)
}

pub(super) fn run_show_with(
    args: ShowArgs,
    opener: &dyn CatalogueOpener,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = ShowConfig::try_from(merged)?;
    let map = load_map(&config, opener)?;
    write_map(writer, &map)
}

fn load_map(config: &ShowConfig, opener: &dyn CatalogueOpener) -> Result<GeoMap, CliError> {
    // Opening a missing path would create an empty catalogue.
    require_existing(&config.database, ARG_DATABASE)?;
    let catalogue = opener.open(&config.database)?;
    catalogue
        .load_map(config.map_id)
        .map_err(|source| CliError::LoadMap {
            id: config.map_id,
            path: config.database.clone(),
            source,
        })?
        .ok_or_else(|| CliError::MapNotFound {
            id: config.map_id,
            path: config.database.clone(),
        })
}
