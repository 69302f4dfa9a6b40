//! Test-only, in-memory catalogue and geometry converters used by unit and
//! behaviour tests.
//!
//! [`MemoryCatalogue`] stages every transaction on a copy of its state and
//! swaps the copy in on commit, so dropping a transaction discards its
//! writes. It also counts each store call to let tests assert round-trip
//! budgets.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::Value;

use crate::{
    Catalogue, CatalogueTransaction, FeatureId, GeoMap, GeometryConversionError,
    GeometryConverter, MapFeature, MapFeatureDraft, MapId, MapStore, Region, RegionDraft,
    RegionId, RegionStore, StoreError,
};

/// Number of calls made against a [`MemoryCatalogue`], committed or not.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreCalls {
    /// Transactions opened.
    pub begins: usize,
    /// Bulk region lookups.
    pub bulk_fetches: usize,
    /// Region inserts.
    pub creates: usize,
    /// Region updates.
    pub updates: usize,
    /// Map inserts.
    pub map_creates: usize,
    /// Successful commits.
    pub commits: usize,
}

impl StoreCalls {
    /// Total number of write calls (region creates, region updates and map
    /// creates).
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.creates + self.updates + self.map_creates
    }
}

/// Failure to inject into a [`MemoryCatalogue`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InjectedFailure {
    /// Operate normally.
    #[default]
    None,
    /// Fail every `create_map` call.
    CreateMap,
    /// Fail `create_region` for the given code.
    CreateRegion(String),
    /// Fail every commit.
    Commit,
}

#[derive(Debug, Default, Clone)]
struct MemoryState {
    regions: BTreeMap<RegionId, Region>,
    maps: BTreeMap<MapId, GeoMap>,
    next_region: i64,
    next_map: i64,
    next_feature: i64,
}

impl MemoryState {
    fn region_by_code(&self, code: &str) -> Option<&Region> {
        self.regions.values().find(|region| region.code == code)
    }
}

/// In-memory [`Catalogue`] with snapshot transactions and call counters.
///
/// # Examples
/// ```
/// # #[cfg(feature = "test-support")]
/// # fn main() {
/// use geomap_core::test_support::MemoryCatalogue;
/// use geomap_core::{Catalogue, RegionDraft, RegionStore};
///
/// let mut catalogue = MemoryCatalogue::default();
/// {
///     let mut tx = catalogue.begin().expect("begin");
///     tx.create_region(RegionDraft::new("US-CA", "California", "POINT(0 0)"))
///         .expect("create");
///     // Dropped without commit.
/// }
/// assert!(catalogue.region_by_code("US-CA").expect("lookup").is_none());
/// assert_eq!(catalogue.calls().creates, 1);
/// # }
/// # #[cfg(not(feature = "test-support"))]
/// # fn main() {}
/// ```
#[derive(Debug, Default)]
pub struct MemoryCatalogue {
    state: MemoryState,
    calls: StoreCalls,
    failure: InjectedFailure,
}

impl MemoryCatalogue {
    /// Create a catalogue whose committed state already holds `drafts`.
    pub fn with_regions<I>(drafts: I) -> Self
    where
        I: IntoIterator<Item = RegionDraft>,
    {
        let mut state = MemoryState::default();
        for draft in drafts {
            state.next_region += 1;
            let region = draft.into_region(RegionId(state.next_region));
            state.regions.insert(region.id, region);
        }
        Self {
            state,
            ..Self::default()
        }
    }

    /// Inject a failure for subsequent transactions.
    #[must_use]
    pub fn failing(mut self, failure: InjectedFailure) -> Self {
        self.failure = failure;
        self
    }

    /// Calls recorded so far.
    #[must_use]
    pub const fn calls(&self) -> StoreCalls {
        self.calls
    }

    /// Committed regions ordered by identity.
    #[must_use]
    pub fn regions(&self) -> Vec<Region> {
        self.state.regions.values().cloned().collect()
    }

    /// Number of committed maps.
    #[must_use]
    pub fn map_count(&self) -> usize {
        self.state.maps.len()
    }
}

impl Catalogue for MemoryCatalogue {
    fn begin(&mut self) -> Result<Box<dyn CatalogueTransaction + '_>, StoreError> {
        self.calls.begins += 1;
        let staged = self.state.clone();
        Ok(Box::new(MemoryTransaction {
            catalogue: self,
            staged,
        }))
    }

    fn load_map(&self, id: MapId) -> Result<Option<GeoMap>, StoreError> {
        Ok(self.state.maps.get(&id).cloned())
    }

    fn region_by_code(&self, code: &str) -> Result<Option<Region>, StoreError> {
        Ok(self.state.region_by_code(code).cloned())
    }
}

struct MemoryTransaction<'a> {
    catalogue: &'a mut MemoryCatalogue,
    staged: MemoryState,
}

impl RegionStore for MemoryTransaction<'_> {
    fn bulk_fetch_by_code(
        &mut self,
        codes: &BTreeSet<String>,
    ) -> Result<HashMap<String, Region>, StoreError> {
        self.catalogue.calls.bulk_fetches += 1;
        Ok(self
            .staged
            .regions
            .values()
            .filter(|region| codes.contains(&region.code))
            .map(|region| (region.code.clone(), region.clone()))
            .collect())
    }

    fn create_region(&mut self, draft: RegionDraft) -> Result<Region, StoreError> {
        self.catalogue.calls.creates += 1;
        if matches!(&self.catalogue.failure, InjectedFailure::CreateRegion(code) if *code == draft.code)
        {
            return Err(injected("insert region"));
        }
        if self.staged.region_by_code(&draft.code).is_some() {
            return Err(StoreError::DuplicateCode { code: draft.code });
        }
        self.staged.next_region += 1;
        let region = draft.into_region(RegionId(self.staged.next_region));
        self.staged.regions.insert(region.id, region.clone());
        Ok(region)
    }

    fn update_region(&mut self, region: &Region) -> Result<(), StoreError> {
        self.catalogue.calls.updates += 1;
        let stored = self
            .staged
            .regions
            .get_mut(&region.id)
            .ok_or(StoreError::UnknownRegion { id: region.id })?;
        stored.overwrite(region.name.clone(), region.geometry_wkt.clone());
        Ok(())
    }
}

impl MapStore for MemoryTransaction<'_> {
    fn create_map(
        &mut self,
        name: &str,
        features: Vec<MapFeatureDraft>,
    ) -> Result<GeoMap, StoreError> {
        self.catalogue.calls.map_creates += 1;
        if self.catalogue.failure == InjectedFailure::CreateMap {
            return Err(injected("insert map"));
        }

        let mut persisted = Vec::with_capacity(features.len());
        for (position, draft) in (0_u32..).zip(features) {
            let region = self
                .staged
                .regions
                .get(&draft.region_id)
                .cloned()
                .ok_or(StoreError::UnknownRegion {
                    id: draft.region_id,
                })?;
            self.staged.next_feature += 1;
            persisted.push(MapFeature {
                id: FeatureId(self.staged.next_feature),
                position,
                region,
                properties: draft.properties,
            });
        }

        self.staged.next_map += 1;
        let map = GeoMap {
            id: MapId(self.staged.next_map),
            name: name.to_owned(),
            features: persisted,
        };
        self.staged.maps.insert(map.id, map.clone());
        Ok(map)
    }
}

impl CatalogueTransaction for MemoryTransaction<'_> {
    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { catalogue, staged } = *self;
        if catalogue.failure == InjectedFailure::Commit {
            return Err(injected("commit transaction"));
        }
        catalogue.state = staged;
        catalogue.calls.commits += 1;
        Ok(())
    }
}

fn injected(operation: &'static str) -> StoreError {
    StoreError::backend(
        operation,
        std::io::Error::other(format!("injected failure during {operation}")),
    )
}

/// Converter that renders every geometry as `GEOMETRY(<json>)`.
///
/// Useful when a test cares about which payload reached a region rather than
/// about real WKT output.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoConverter;

impl GeometryConverter for EchoConverter {
    fn to_wkt(&self, geometry: &Value) -> Result<String, GeometryConversionError> {
        Ok(format!("GEOMETRY({geometry})"))
    }
}

/// Converter that rejects geometries whose `type` equals the configured
/// value and echoes the rest like [`EchoConverter`].
#[derive(Debug, Clone)]
pub struct FailingConverter {
    rejected_type: String,
}

impl FailingConverter {
    /// Reject geometries with the given GeoJSON `type`.
    pub fn rejecting(rejected_type: impl Into<String>) -> Self {
        Self {
            rejected_type: rejected_type.into(),
        }
    }
}

impl GeometryConverter for FailingConverter {
    fn to_wkt(&self, geometry: &Value) -> Result<String, GeometryConversionError> {
        if geometry.get("type").and_then(Value::as_str) == Some(self.rejected_type.as_str()) {
            return Err(GeometryConversionError::new(format!(
                "{} geometries are not supported",
                self.rejected_type
            )));
        }
        EchoConverter.to_wkt(geometry)
    }
}
