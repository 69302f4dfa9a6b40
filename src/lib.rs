//! Facade crate for the geomap engine.
//!
//! This crate re-exports the region and map domain types, the store ports and
//! the GeoJSON ingestion entry points. The SQLite catalogue and the ingestion
//! pipeline sit behind feature flags.

#![forbid(unsafe_code)]

pub use geomap_core::{
    Catalogue, CatalogueTransaction, ConflictPolicy, FeatureId, GeoMap, GeometryConversionError,
    GeometryConverter, MapFeature, MapFeatureDraft, MapId, MapStore, ParseConflictPolicyError,
    Properties, Region, RegionDraft, RegionId, RegionStore, StoreError,
};

#[cfg(feature = "store-sqlite")]
pub use geomap_core::{SqliteCatalogue, SqliteCatalogueError};

#[cfg(feature = "test-support")]
pub use geomap_core::test_support;

#[cfg(feature = "ingest")]
pub use geomap_ingest::{
    BatchStage, IngestError, InvalidFeatureReason, MalformedInput, MapIngestor, WktConverter,
    create_map,
};
