//! Resolution of region codes to stored regions under a conflict policy.
//!
//! A batch performs one bulk lookup for every distinct code, then resolves
//! features in input order against a batch-local [`RegionCache`]. Unknown
//! codes are created on first sight from their first occurrence; codes that
//! existed before the batch are reused or, under [`ConflictPolicy::Update`],
//! overwritten in the cache and written back once by [`RegionResolver::flush`].

use std::collections::{BTreeSet, HashMap, HashSet, hash_map::Entry};

use geomap_core::{ConflictPolicy, GeometryConverter, Region, RegionDraft, RegionStore};
use log::{debug, warn};

use crate::error::{BatchStage, IngestError};
use crate::validate::ValidatedFeature;

/// Counters describing how a batch resolved its regions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Regions returned by the bulk lookup.
    pub fetched: usize,
    /// Regions created because their code was unknown.
    pub created: usize,
    /// Regions written back by [`RegionResolver::flush`].
    pub updated: usize,
    /// Features served from the cache without a create.
    pub reused: usize,
}

/// Regions known to one batch, keyed by code.
///
/// Built by [`RegionResolver::resolve_all`] and never shared between batches.
#[derive(Debug, Default)]
pub struct RegionCache {
    regions: HashMap<String, Region>,
    dirty: Vec<String>,
    dirty_codes: HashSet<String>,
    created: HashSet<String>,
    stats: ResolutionStats,
}

impl RegionCache {
    /// Cached region for `code`, if any.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Region> {
        self.regions.get(code)
    }

    /// Number of cached regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the cache holds no region.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Codes whose cached region differs from the store, in first-seen order.
    #[must_use]
    pub fn pending_updates(&self) -> &[String] {
        &self.dirty
    }

    /// Counters gathered so far.
    #[must_use]
    pub const fn stats(&self) -> ResolutionStats {
        self.stats
    }
}

/// Resolves feature codes to regions for a single conflict policy.
#[derive(Debug, Clone)]
pub struct RegionResolver<C> {
    converter: C,
    policy: ConflictPolicy,
}

impl<C: GeometryConverter> RegionResolver<C> {
    /// Build a resolver converting geometries with `converter`.
    pub const fn new(converter: C, policy: ConflictPolicy) -> Self {
        Self { converter, policy }
    }

    /// Policy applied to codes that already exist.
    #[must_use]
    pub const fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Load every stored region whose code is in `codes` with a single store
    /// call. An empty code set skips the store entirely.
    ///
    /// # Errors
    /// Returns [`IngestError::Persistence`] when the lookup fails.
    pub fn resolve_all<S>(
        &self,
        store: &mut S,
        codes: &BTreeSet<String>,
    ) -> Result<RegionCache, IngestError>
    where
        S: RegionStore + ?Sized,
    {
        let mut cache = RegionCache::default();
        if codes.is_empty() {
            return Ok(cache);
        }
        cache.regions = store
            .bulk_fetch_by_code(codes)
            .map_err(IngestError::persistence(BatchStage::Resolving))?;
        cache.stats.fetched = cache.regions.len();
        debug!(
            "bulk lookup found {} of {} region codes",
            cache.stats.fetched,
            codes.len()
        );
        Ok(cache)
    }

    /// Resolve the region for `feature`, creating it when its code is
    /// unknown.
    ///
    /// # Errors
    /// Returns [`IngestError::GeometryConversion`] when the geometry cannot
    /// be converted and [`IngestError::Persistence`] when creating the region
    /// fails.
    pub fn resolve<'c, S>(
        &self,
        store: &mut S,
        feature: &ValidatedFeature,
        cache: &'c mut RegionCache,
    ) -> Result<&'c Region, IngestError>
    where
        S: RegionStore + ?Sized,
    {
        match cache.regions.entry(feature.code.clone()) {
            Entry::Occupied(entry) => {
                let region = entry.into_mut();
                if self.policy.overwrites() {
                    let geometry_wkt = self.convert(feature)?;
                    // Regions created by this batch keep their first occurrence.
                    if !cache.created.contains(&feature.code) {
                        region.overwrite(feature.name.as_str(), geometry_wkt);
                        if cache.dirty_codes.insert(feature.code.clone()) {
                            cache.dirty.push(feature.code.clone());
                        }
                    }
                }
                cache.stats.reused += 1;
                Ok(region)
            }
            Entry::Vacant(entry) => {
                let geometry_wkt = self.convert(feature)?;
                let draft = RegionDraft::new(
                    feature.code.as_str(),
                    feature.name.as_str(),
                    geometry_wkt,
                );
                let region = store
                    .create_region(draft)
                    .map_err(IngestError::persistence(BatchStage::Resolving))?;
                debug!("created region {} for code {:?}", region.id, region.code);
                cache.stats.created += 1;
                cache.created.insert(feature.code.clone());
                Ok(entry.insert(region))
            }
        }
    }

    /// Write every region overwritten in the cache back to the store, once
    /// each and in first-seen order.
    ///
    /// # Errors
    /// Returns [`IngestError::Persistence`] when an update fails.
    pub fn flush<S>(&self, store: &mut S, cache: &mut RegionCache) -> Result<(), IngestError>
    where
        S: RegionStore + ?Sized,
    {
        for code in std::mem::take(&mut cache.dirty) {
            let Some(region) = cache.regions.get(&code) else {
                continue;
            };
            store
                .update_region(region)
                .map_err(IngestError::persistence(BatchStage::Resolving))?;
            cache.stats.updated += 1;
        }
        cache.dirty_codes.clear();
        Ok(())
    }

    fn convert(&self, feature: &ValidatedFeature) -> Result<String, IngestError> {
        self.converter.to_wkt(&feature.geometry).map_err(|source| {
            warn!(
                "failed to convert geometry of feature {} (region {:?}): {source}",
                feature.index, feature.code
            );
            IngestError::GeometryConversion {
                index: feature.index,
                code: feature.code.clone(),
                feature: Box::new(feature.raw.clone()),
                source,
            }
        })
    }
}
