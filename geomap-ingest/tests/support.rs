//! Shared GeoJSON builders for ingestion tests.

use serde_json::{Value, json};

/// Geometry type that [`rejecting_converter`] refuses to convert.
pub const UNSUPPORTED_GEOMETRY: &str = "Unsupported";

/// Build a feature for `code` with a point geometry.
pub fn feature(code: &str, name: &str) -> Value {
    feature_with_geometry(code, name, "Point")
}

/// Build a feature for `code` whose geometry has the given GeoJSON type.
pub fn feature_with_geometry(code: &str, name: &str, geometry_type: &str) -> Value {
    json!({
        "type": "Feature",
        "properties": {"code": code, "name": name, "source": "test"},
        "geometry": {"type": geometry_type, "coordinates": [0.0, 0.0]},
    })
}

/// Wrap `features` in a feature collection and serialise it.
pub fn document(features: Vec<Value>) -> String {
    json!({"type": "FeatureCollection", "features": features}).to_string()
}

/// Build a document with one point feature per code, named after the code.
pub fn document_for_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> String {
    document(
        codes
            .into_iter()
            .map(|code| feature(code, &format!("Region {code}")))
            .collect(),
    )
}

/// Converter rejecting [`UNSUPPORTED_GEOMETRY`] and echoing everything else.
pub fn rejecting_converter() -> geomap_core::test_support::FailingConverter {
    geomap_core::test_support::FailingConverter::rejecting(UNSUPPORTED_GEOMETRY)
}

/// Split a comma-separated step argument into trimmed codes.
pub fn split_codes(codes: &str) -> Vec<String> {
    codes
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_owned)
        .collect()
}
