//! `create` command: ingest a GeoJSON document as a new map.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use geomap_core::{ConflictPolicy, GeoMap};
use geomap_ingest::WktConverter;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::catalogue::{CatalogueOpener, SqliteCatalogueOpener};
use crate::{
    ARG_CREATE_GEOJSON, ARG_CREATE_NAME, ARG_CREATE_POLICY, ARG_DATABASE, CliError,
    DEFAULT_DATABASE, ENV_CREATE_GEOJSON, ENV_CREATE_NAME, require_existing, write_map,
};

/// CLI arguments for the `create` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "create",
    long_about = "Read a GeoJSON FeatureCollection whose features carry a \
                 region code and name, resolve every code against the \
                 catalogue, and store the features as a new named map. The \
                 whole document is written in one transaction.",
    about = "Create a map from a GeoJSON feature collection"
)]
#[ortho_config(prefix = "GEOMAP")]
pub(crate) struct CreateArgs {
    /// Path to the GeoJSON FeatureCollection.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) geojson: Option<Utf8PathBuf>,
    /// Display name of the new map.
    #[arg(long = ARG_CREATE_NAME, value_name = "name")]
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// What to do with regions that already exist: `create-only` or `update`.
    #[arg(long = ARG_CREATE_POLICY, value_name = "policy")]
    #[serde(default)]
    pub(crate) policy: Option<String>,
    /// Path to the SQLite catalogue (default `geomap.db`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl CreateArgs {
    pub(crate) fn into_config(self) -> Result<CreateConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CreateConfig::try_from(merged)
    }
}

/// Resolved `create` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CreateConfig {
    /// Path to the GeoJSON document.
    pub(crate) geojson: Utf8PathBuf,
    /// Name given to the new map.
    pub(crate) name: String,
    /// Policy for codes already in the catalogue.
    pub(crate) policy: ConflictPolicy,
    /// Path to the SQLite catalogue.
    pub(crate) database: Utf8PathBuf,
}

impl CreateConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.geojson, ARG_CREATE_GEOJSON)
    }

    fn prepare_database(&self) -> Result<(), CliError> {
        geomap_fs::ensure_parent_dir(&self.database).map_err(|source| {
            CliError::CreateDatabaseDir {
                path: self.database.clone(),
                source,
            }
        })
    }
}

impl TryFrom<CreateArgs> for CreateConfig {
    type Error = CliError;

    fn try_from(args: CreateArgs) -> Result<Self, Self::Error> {
        let geojson = args.geojson.ok_or(CliError::MissingArgument {
            field: ARG_CREATE_GEOJSON,
            env: ENV_CREATE_GEOJSON,
        })?;
        let name = args.name.ok_or(CliError::MissingArgument {
            field: ARG_CREATE_NAME,
            env: ENV_CREATE_NAME,
        })?;
        let policy = args
            .policy
            .as_deref()
            .map(str::parse::<ConflictPolicy>)
            .transpose()
            .map_err(|source| CliError::InvalidPolicy {
                field: ARG_CREATE_POLICY,
                source,
            })?
            .unwrap_or_default();
        let database = args
            .database
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE));

        Ok(Self {
            geojson,
            name,
            policy,
            database,
        })
    }
}

pub(super) fn run_create(args: CreateArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_create_with(args, &SqliteCatalogueOpener, &mut stdout)
}

pub(super) fn run_create_with(
    args: CreateArgs,
    opener: &dyn CatalogueOpener,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let map = execute_create(args, opener)?;
    write_map(writer, &map)
}

fn execute_create(args: CreateArgs, opener: &dyn CatalogueOpener) -> Result<GeoMap, CliError> {
    let config = resolve_create_config(args)?;
    let raw = load_geojson(&config.geojson)?;
    config.prepare_database()?;
    let mut catalogue = opener.open(&config.database)?;
    let map = geomap_ingest::create_map(
        catalogue.as_mut(),
        WktConverter,
        &config.name,
        &raw,
        config.policy,
    )
    .map_err(|source| CliError::CreateMap {
        name: config.name.clone(),
        source: Box::new(source),
    })?;
    info!(
        "stored map {} ({:?}, {} features) in {}",
        map.id,
        map.name,
        map.features.len(),
        config.database
    );
    Ok(map)
}

fn resolve_create_config(args: CreateArgs) -> Result<CreateConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Reads the GeoJSON document at `path` as text.
pub(super) fn load_geojson(path: &Utf8Path) -> Result<String, CliError> {
    geomap_fs::read_utf8_file(path).map_err(|source| CliError::ReadGeoJson {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<CreateConfig, CliError> {
    let merged = CreateArgs::merge_from_layers(layers).map_err(CliError::from)?;
    CreateConfig::try_from(merged)
}
