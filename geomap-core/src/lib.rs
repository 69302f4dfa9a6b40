//! Core domain types for the geomap engine.
//!
//! The crate defines the region and map models, the conflict policy applied
//! when a region code recurs, and the ports through which ingestion reaches
//! persistence ([`Catalogue`], [`RegionStore`], [`MapStore`]) and geometry
//! conversion ([`GeometryConverter`]). A SQLite adapter ships behind the
//! `store-sqlite` feature.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod geometry;
mod map;
mod policy;
mod region;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use geometry::{GeometryConversionError, GeometryConverter};
pub use map::{FeatureId, GeoMap, MapFeature, MapFeatureDraft, MapId, Properties};
pub use policy::{ConflictPolicy, ParseConflictPolicyError};
pub use region::{Region, RegionDraft, RegionId};
pub use store::{Catalogue, CatalogueTransaction, MapStore, RegionStore, StoreError};

#[cfg(feature = "store-sqlite")]
pub use store::{SqliteCatalogue, SqliteCatalogueError};
