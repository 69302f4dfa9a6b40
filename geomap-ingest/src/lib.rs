//! GeoJSON ingestion for the geomap engine.
//!
//! Responsibilities:
//! - Validate feature collections before any store access.
//! - Resolve region codes with one bulk lookup per batch and apply the
//!   caller's [`ConflictPolicy`](geomap_core::ConflictPolicy).
//! - Assemble and commit maps atomically through a
//!   [`Catalogue`](geomap_core::Catalogue) transaction.
//! - Convert GeoJSON geometries to WKT with the georust crates.
//!
//! Invariants:
//! - A batch is all-or-nothing; an error leaves the store untouched.
//! - Features sharing a code within a batch resolve to one region identity.
//! - No global mutable state.

#![forbid(unsafe_code)]

mod builder;
mod convert;
mod error;
mod ingest;
mod resolver;
mod validate;

pub use builder::{BuiltMap, MapBuilder, validate_map_name};
pub use convert::WktConverter;
pub use error::{BatchStage, IngestError, InvalidFeatureReason, MalformedInput};
pub use ingest::{MapIngestor, create_map};
pub use resolver::{RegionCache, RegionResolver, ResolutionStats};
pub use validate::{FeatureSet, ValidatedFeature, validate_geojson};
