//! Error types emitted by the geomap CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`; large payloads are boxed.

use std::sync::Arc;

use camino::Utf8PathBuf;
use geomap_core::{MapId, ParseConflictPolicyError, SqliteCatalogueError, StoreError};
use geomap_ingest::IngestError;
use thiserror::Error;

/// Errors emitted by the geomap CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The conflict policy option names no known policy.
    #[error("invalid --{field}: {source}")]
    InvalidPolicy {
        field: &'static str,
        #[source]
        source: ParseConflictPolicyError,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Creating the directory that holds the database failed.
    #[error("failed to create parent directory for database {path:?}: {source}")]
    CreateDatabaseDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite catalogue failed.
    #[error("failed to open catalogue at {path:?}: {source}")]
    OpenCatalogue {
        path: Utf8PathBuf,
        #[source]
        source: Box<SqliteCatalogueError>,
    },
    /// Reading the GeoJSON document failed.
    #[error("failed to read GeoJSON at {path:?}: {source}")]
    ReadGeoJson {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Ingesting the GeoJSON document failed; nothing was written.
    #[error("failed to create map {name:?}: {source}")]
    CreateMap {
        name: String,
        #[source]
        source: Box<IngestError>,
    },
    /// Loading a map from the catalogue failed.
    #[error("failed to load map {id} from {path:?}: {source}")]
    LoadMap {
        id: MapId,
        path: Utf8PathBuf,
        #[source]
        source: StoreError,
    },
    /// The catalogue holds no map with the requested identity.
    #[error("map {id} not found in {path:?}")]
    MapNotFound { id: MapId, path: Utf8PathBuf },
    /// Serializing the map failed.
    #[error("failed to serialize map: {0}")]
    SerializeMap(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
