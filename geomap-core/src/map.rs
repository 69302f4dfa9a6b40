use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Region, RegionId};

/// Free-form key/value payload copied verbatim from an input feature.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Store-assigned identity of a [`GeoMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(pub i64);

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Store-assigned identity of a [`MapFeature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub i64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A named, ordered collection of region references.
///
/// Features are owned by the map and listed in ingestion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMap {
    /// Identity assigned by the store.
    pub id: MapId,
    /// Display name supplied by the caller.
    pub name: String,
    /// Features in input order.
    pub features: Vec<MapFeature>,
}

impl GeoMap {
    /// Identities of the regions referenced by the map, in first-seen order
    /// and without duplicates.
    ///
    /// # Examples
    /// ```
    /// use geomap_core::{FeatureId, GeoMap, MapFeature, MapId, Properties, RegionDraft, RegionId};
    ///
    /// let region = RegionDraft::new("US-CA", "California", "POINT(0 0)").into_region(RegionId(7));
    /// let feature = |id| MapFeature {
    ///     id: FeatureId(id),
    ///     position: 0,
    ///     region: region.clone(),
    ///     properties: Properties::new(),
    /// };
    /// let map = GeoMap {
    ///     id: MapId(1),
    ///     name: "States".into(),
    ///     features: vec![feature(1), feature(2)],
    /// };
    ///
    /// assert_eq!(map.region_ids(), vec![RegionId(7)]);
    /// ```
    #[must_use]
    pub fn region_ids(&self) -> Vec<RegionId> {
        let mut seen = Vec::new();
        for feature in &self.features {
            if !seen.contains(&feature.region.id) {
                seen.push(feature.region.id);
            }
        }
        seen
    }
}

/// One entry of a [`GeoMap`] pairing a region with the feature's properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFeature {
    /// Identity assigned by the store.
    pub id: FeatureId,
    /// Zero-based position of the feature within its map.
    pub position: u32,
    /// Region the feature refers to, as committed with the map.
    pub region: Region,
    /// Opaque payload copied from the input feature.
    pub properties: Properties,
}

/// A feature awaiting persistence as part of a new map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFeatureDraft {
    /// Identity of the referenced region. The region must already exist in
    /// the transaction writing the map.
    pub region_id: RegionId,
    /// Opaque payload copied from the input feature.
    pub properties: Properties,
}
