//! Assembly of a validated feature set into a persisted map.

use geomap_core::{
    ConflictPolicy, GeoMap, GeometryConverter, MapFeatureDraft, MapStore, RegionId, RegionStore,
};
use log::debug;

use crate::error::{BatchStage, IngestError};
use crate::resolver::{RegionResolver, ResolutionStats};
use crate::validate::FeatureSet;

/// Reject blank map names.
///
/// # Errors
/// Returns [`IngestError::InvalidMapName`] when `name` is empty or only
/// whitespace.
pub fn validate_map_name(name: &str) -> Result<&str, IngestError> {
    if name.trim().is_empty() {
        return Err(IngestError::InvalidMapName);
    }
    Ok(name)
}

/// A map together with the resolution counters of the batch that built it.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltMap {
    /// The persisted map.
    pub map: GeoMap,
    /// How the batch resolved its regions.
    pub stats: ResolutionStats,
}

/// Builds maps inside an open store transaction.
///
/// [`MapBuilder::build`] never commits; the caller commits on success or
/// drops the transaction to roll every write back.
#[derive(Debug, Clone)]
pub struct MapBuilder<C> {
    resolver: RegionResolver<C>,
}

impl<C: GeometryConverter> MapBuilder<C> {
    /// Create a builder resolving regions under `policy`.
    pub const fn new(converter: C, policy: ConflictPolicy) -> Self {
        Self {
            resolver: RegionResolver::new(converter, policy),
        }
    }

    /// Resolve the regions of `features` and write a map named `name` whose
    /// features follow input order.
    ///
    /// # Errors
    /// Returns [`IngestError::InvalidMapName`] before any store access for a
    /// blank name, [`IngestError::GeometryConversion`] when a geometry
    /// cannot be converted, and [`IngestError::Persistence`] for store
    /// failures.
    pub fn build<T>(
        &self,
        tx: &mut T,
        name: &str,
        features: &FeatureSet,
    ) -> Result<BuiltMap, IngestError>
    where
        T: RegionStore + MapStore + ?Sized,
    {
        validate_map_name(name)?;

        enter(name, BatchStage::Resolving);
        let mut cache = self.resolver.resolve_all(tx, &features.distinct_codes())?;
        let mut region_ids: Vec<RegionId> = Vec::with_capacity(features.len());
        for feature in features {
            let region = self.resolver.resolve(tx, feature, &mut cache)?;
            region_ids.push(region.id);
        }
        self.resolver.flush(tx, &mut cache)?;

        enter(name, BatchStage::Assembling);
        let drafts = features
            .iter()
            .zip(region_ids)
            .map(|(feature, region_id)| MapFeatureDraft {
                region_id,
                properties: feature.properties.clone(),
            })
            .collect();

        enter(name, BatchStage::Committing);
        let map = tx
            .create_map(name, drafts)
            .map_err(IngestError::persistence(BatchStage::Committing))?;
        Ok(BuiltMap {
            map,
            stats: cache.stats(),
        })
    }
}

pub(crate) fn enter(name: &str, stage: BatchStage) {
    debug!("map {name:?}: {stage}");
}
