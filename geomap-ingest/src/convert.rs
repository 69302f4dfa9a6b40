//! GeoJSON geometry to WKT conversion backed by the georust crates.

use geo::Geometry;
use geomap_core::{GeometryConversionError, GeometryConverter};
use serde_json::Value;
use wkt::ToWkt;

/// Converts GeoJSON geometry objects to well-known text.
///
/// The payload is parsed with `geojson`, lowered to a [`geo::Geometry`] and
/// rendered with `wkt`. Every GeoJSON geometry type is supported, including
/// `GeometryCollection`.
///
/// # Examples
/// ```
/// use geomap_core::GeometryConverter;
/// use geomap_ingest::WktConverter;
/// use serde_json::json;
///
/// let wkt = WktConverter
///     .to_wkt(&json!({"type": "Point", "coordinates": [1.5, 2.0]}))
///     .expect("point converts");
/// assert!(wkt.starts_with("POINT"));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct WktConverter;

impl GeometryConverter for WktConverter {
    fn to_wkt(&self, geometry: &Value) -> Result<String, GeometryConversionError> {
        let parsed = geojson::Geometry::from_json_value(geometry.clone()).map_err(|source| {
            GeometryConversionError::with_source("invalid GeoJSON geometry", source)
        })?;
        let shape = Geometry::<f64>::try_from(parsed).map_err(|source| {
            GeometryConversionError::with_source("unsupported GeoJSON geometry", source)
        })?;
        Ok(shape.wkt_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::point(json!({"type": "Point", "coordinates": [1.5, 2.5]}), "POINT")]
    #[case::line(
        json!({"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}),
        "LINESTRING"
    )]
    #[case::polygon(
        json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}),
        "POLYGON"
    )]
    #[case::multi_polygon(
        json!({"type": "MultiPolygon", "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]]}),
        "MULTIPOLYGON"
    )]
    fn converts_geometry_types(#[case] geometry: Value, #[case] prefix: &str) {
        let wkt = WktConverter.to_wkt(&geometry).expect("geometry converts");
        assert!(wkt.starts_with(prefix), "unexpected WKT {wkt}");
    }

    #[rstest]
    fn point_keeps_coordinates() {
        let wkt = WktConverter
            .to_wkt(&json!({"type": "Point", "coordinates": [1.5, 2.5]}))
            .expect("point converts");
        assert_eq!(wkt, "POINT(1.5 2.5)");
    }

    #[rstest]
    #[case::unknown_type(json!({"type": "Circle", "coordinates": [0.0, 0.0]}))]
    #[case::missing_coordinates(json!({"type": "Point"}))]
    #[case::not_an_object(json!("POINT(0 0)"))]
    fn rejects_unconvertible_geometry(#[case] geometry: Value) {
        let error = WktConverter
            .to_wkt(&geometry)
            .expect_err("geometry should be rejected");
        assert!(std::error::Error::source(&error).is_some());
    }
}
