//! Public entry point turning a GeoJSON document into a committed map.

use geomap_core::{Catalogue, ConflictPolicy, GeoMap, GeometryConverter};
use log::{debug, error, info};

use crate::builder::{MapBuilder, enter, validate_map_name};
use crate::error::{BatchStage, IngestError};
use crate::validate::validate_geojson;

/// Validate `raw_geojson` and persist it as a new map named `name`.
///
/// The map name and the whole document are checked before the store is
/// touched. Region lookups, creations, updates and the map itself are then
/// written in one transaction: on any failure the transaction is dropped and
/// nothing of the batch remains.
///
/// # Errors
/// Returns the [`IngestError`] of the first failing stage; see
/// [`IngestError::stage`].
///
/// # Examples
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use geomap_core::{ConflictPolicy, SqliteCatalogue};
/// use geomap_ingest::{WktConverter, create_map};
///
/// let mut catalogue = SqliteCatalogue::open_in_memory()?;
/// let raw = r#"{"type": "FeatureCollection", "features": [
///     {"properties": {"code": "US-CA", "name": "California"},
///      "geometry": {"type": "Point", "coordinates": [-119.4, 36.7]}},
///     {"properties": {"code": "US-CA", "name": "California"},
///      "geometry": {"type": "Point", "coordinates": [-119.4, 36.7]}}
/// ]}"#;
///
/// let map = create_map(&mut catalogue, WktConverter, "States", raw, ConflictPolicy::CreateOnly)?;
/// assert_eq!(map.features.len(), 2);
/// assert_eq!(map.region_ids().len(), 1);
/// # Ok(())
/// # }
/// ```
pub fn create_map<K, C>(
    catalogue: &mut K,
    converter: C,
    name: &str,
    raw_geojson: &str,
    policy: ConflictPolicy,
) -> Result<GeoMap, IngestError>
where
    K: Catalogue + ?Sized,
    C: GeometryConverter,
{
    info!("creating map {name:?} with policy {policy}");
    enter(name, BatchStage::Validating);
    let outcome = validate_map_name(name)
        .and_then(|_| validate_geojson(raw_geojson))
        .and_then(|features| {
            let builder = MapBuilder::new(converter, policy);
            let mut tx = catalogue
                .begin()
                .map_err(IngestError::persistence(BatchStage::Resolving))?;
            let built = builder.build(&mut *tx, name, &features)?;
            tx.commit().map_err(|source| {
                error!("failed to commit map {name:?}: {source}");
                IngestError::Persistence {
                    stage: BatchStage::Committing,
                    source,
                }
            })?;
            Ok(built)
        });

    match outcome {
        Ok(built) => {
            enter(name, BatchStage::Committed);
            let stats = built.stats;
            info!(
                "created map {} ({name:?}) with {} features: {} regions fetched, {} created, {} updated, {} reused",
                built.map.id,
                built.map.features.len(),
                stats.fetched,
                stats.created,
                stats.updated,
                stats.reused
            );
            Ok(built.map)
        }
        Err(err) => {
            debug!("map {name:?}: {} at {}", BatchStage::Aborted, err.stage());
            Err(err)
        }
    }
}

/// Ingests maps into one catalogue with one geometry converter.
///
/// # Examples
/// ```
/// use geomap_core::ConflictPolicy;
/// use geomap_core::test_support::{EchoConverter, MemoryCatalogue};
/// use geomap_ingest::{IngestError, MapIngestor};
///
/// let mut ingestor = MapIngestor::new(MemoryCatalogue::default(), EchoConverter);
/// let error = ingestor
///     .create_map("States", "not json", ConflictPolicy::CreateOnly)
///     .expect_err("malformed input");
///
/// assert!(matches!(error, IngestError::MalformedInput { .. }));
/// assert_eq!(ingestor.catalogue().calls().begins, 0);
/// ```
#[derive(Debug)]
pub struct MapIngestor<K, C> {
    catalogue: K,
    converter: C,
}

impl<K: Catalogue, C: GeometryConverter> MapIngestor<K, C> {
    /// Pair a catalogue with a geometry converter.
    pub const fn new(catalogue: K, converter: C) -> Self {
        Self {
            catalogue,
            converter,
        }
    }

    /// Validate `raw_geojson` and persist it as a new map named `name`.
    ///
    /// # Errors
    /// See [`create_map`].
    pub fn create_map(
        &mut self,
        name: &str,
        raw_geojson: &str,
        policy: ConflictPolicy,
    ) -> Result<GeoMap, IngestError> {
        create_map(
            &mut self.catalogue,
            &self.converter,
            name,
            raw_geojson,
            policy,
        )
    }

    /// The underlying catalogue.
    pub const fn catalogue(&self) -> &K {
        &self.catalogue
    }
}
