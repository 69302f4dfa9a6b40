//! Opening the catalogue a command works against.

use camino::Utf8Path;
use geomap_core::{Catalogue, SqliteCatalogue};
use log::debug;

use crate::CliError;

/// Opens the catalogue for the current invocation.
pub(crate) trait CatalogueOpener {
    fn open(&self, path: &Utf8Path) -> Result<Box<dyn Catalogue>, CliError>;
}

/// Opens (creating if needed) a SQLite catalogue on disk.
pub(crate) struct SqliteCatalogueOpener;

impl CatalogueOpener for SqliteCatalogueOpener {
    fn open(&self, path: &Utf8Path) -> Result<Box<dyn Catalogue>, CliError> {
        debug!("opening catalogue at {path}");
        let catalogue = SqliteCatalogue::open(path.as_std_path()).map_err(|source| {
            CliError::OpenCatalogue {
                path: path.to_path_buf(),
                source: Box::new(source),
            }
        })?;
        Ok(Box::new(catalogue))
    }
}
