//! Command-line interface for building region maps from GeoJSON.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use geomap_core::GeoMap;

mod catalogue;
mod create;
mod error;
mod show;

#[cfg(test)]
mod tests;

pub use error::CliError;

use create::{CreateArgs, run_create};
use show::{ShowArgs, run_show};

pub(crate) const ARG_CREATE_GEOJSON: &str = "geojson";
pub(crate) const ARG_CREATE_NAME: &str = "name";
pub(crate) const ARG_CREATE_POLICY: &str = "policy";
pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_SHOW_MAP_ID: &str = "map-id";
pub(crate) const ENV_CREATE_GEOJSON: &str = "GEOMAP_CMDS_CREATE_GEOJSON";
pub(crate) const ENV_CREATE_NAME: &str = "GEOMAP_CMDS_CREATE_NAME";
pub(crate) const ENV_SHOW_MAP_ID: &str = "GEOMAP_CMDS_SHOW_MAP_ID";
pub(crate) const DEFAULT_DATABASE: &str = "geomap.db";

/// Run the geomap CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Create(args) => run_create(args),
        Command::Show(args) => run_show(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "geomap",
    about = "Build and inspect region maps stored in a SQLite catalogue",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Ingest a GeoJSON feature collection as a new map.
    Create(CreateArgs),
    /// Print a stored map as JSON.
    Show(ShowArgs),
}

/// Check that `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match geomap_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write `map` to `writer` as pretty JSON followed by a newline.
pub(crate) fn write_map(writer: &mut dyn Write, map: &GeoMap) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(map).map_err(CliError::SerializeMap)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
