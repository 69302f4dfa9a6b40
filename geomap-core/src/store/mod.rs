//! Persistence ports for regions and maps.
//!
//! Ingestion talks to storage through a [`Catalogue`], which hands out one
//! [`CatalogueTransaction`] per batch. Every write of a batch goes through
//! that transaction; dropping it without calling
//! [`CatalogueTransaction::commit`] discards the writes.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::{GeoMap, MapFeatureDraft, MapId, Region, RegionDraft, RegionId};

#[cfg(feature = "store-sqlite")]
mod schema;
#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use schema::SCHEMA_VERSION;
#[cfg(feature = "store-sqlite")]
pub use sqlite::{DEFAULT_BUSY_TIMEOUT, SqliteCatalogue, SqliteCatalogueError};

/// Errors surfaced by store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer already created a region with this code.
    #[error("region code {code:?} already exists")]
    DuplicateCode {
        /// Conflicting region code.
        code: String,
    },
    /// An update targeted a region the store does not know.
    #[error("region {id} does not exist")]
    UnknownRegion {
        /// Identity that failed to resolve.
        id: RegionId,
    },
    /// The backing engine failed while performing `operation`.
    #[error("store failed to {operation}: {source}")]
    Backend {
        /// Short description of the failed operation.
        operation: &'static str,
        /// Error reported by the engine.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl StoreError {
    /// Wrap an engine error raised while performing `operation`.
    pub fn backend<E>(operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            operation,
            source: Box::new(source),
        }
    }
}

/// Lookup and write access to regions.
pub trait RegionStore {
    /// Fetch every region whose code appears in `codes`, keyed by code.
    ///
    /// Codes without a stored region are absent from the result. Callers rely
    /// on this being a single logical lookup regardless of how many codes are
    /// supplied.
    fn bulk_fetch_by_code(
        &mut self,
        codes: &BTreeSet<String>,
    ) -> Result<HashMap<String, Region>, StoreError>;

    /// Persist a new region and return it with its assigned identity.
    ///
    /// Returns [`StoreError::DuplicateCode`] when the code is already taken.
    fn create_region(&mut self, draft: RegionDraft) -> Result<Region, StoreError>;

    /// Overwrite the name and geometry of an existing region.
    fn update_region(&mut self, region: &Region) -> Result<(), StoreError>;
}

/// Write access to maps.
pub trait MapStore {
    /// Persist a map with its features in the given order and return it with
    /// all identities populated.
    fn create_map(
        &mut self,
        name: &str,
        features: Vec<MapFeatureDraft>,
    ) -> Result<GeoMap, StoreError>;
}

/// A unit of work spanning region and map writes.
///
/// Dropping the transaction without committing rolls back every write made
/// through it.
pub trait CatalogueTransaction: RegionStore + MapStore {
    /// Make every write of this transaction durable and visible.
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Entry point to a region and map store.
///
/// # Examples
/// ```
/// # #[cfg(feature = "store-sqlite")]
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use geomap_core::{Catalogue, RegionDraft, RegionStore, SqliteCatalogue};
///
/// let mut catalogue = SqliteCatalogue::open_in_memory()?;
/// let mut tx = catalogue.begin()?;
/// tx.create_region(RegionDraft::new("US-CA", "California", "POINT(0 0)"))?;
/// tx.commit()?;
///
/// let region = catalogue.region_by_code("US-CA")?.expect("committed region");
/// assert_eq!(region.name, "California");
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "store-sqlite"))]
/// # fn main() {}
/// ```
pub trait Catalogue {
    /// Begin a transaction covering one ingestion batch.
    fn begin(&mut self) -> Result<Box<dyn CatalogueTransaction + '_>, StoreError>;

    /// Load a committed map with its features, if it exists.
    fn load_map(&self, id: MapId) -> Result<Option<GeoMap>, StoreError>;

    /// Load a committed region by its code, if it exists.
    fn region_by_code(&self, code: &str) -> Result<Option<Region>, StoreError>;
}
