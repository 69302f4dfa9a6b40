//! Port for converting GeoJSON geometry payloads into well-known text.

use thiserror::Error;

/// Failure raised by a [`GeometryConverter`].
///
/// The message is opaque to the ingestion pipeline; an optional source keeps
/// the converter's own error available for diagnostics.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct GeometryConversionError {
    /// Human-readable description of the failure.
    pub message: String,
    /// Underlying converter error, when one exists.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl GeometryConversionError {
    /// Construct an error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Construct an error wrapping the converter's own failure.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Converts a GeoJSON geometry object into well-known text.
///
/// # Examples
/// ```
/// use geomap_core::{GeometryConversionError, GeometryConverter};
/// use serde_json::{Value, json};
///
/// struct PointsOnly;
///
/// impl GeometryConverter for PointsOnly {
///     fn to_wkt(&self, geometry: &Value) -> Result<String, GeometryConversionError> {
///         match geometry["coordinates"].as_array().map(Vec::as_slice) {
///             Some([x, y]) => Ok(format!("POINT({x} {y})")),
///             _ => Err(GeometryConversionError::new("expected a point")),
///         }
///     }
/// }
///
/// let wkt = PointsOnly.to_wkt(&json!({"type": "Point", "coordinates": [1, 2]}));
/// assert_eq!(wkt.expect("point converts"), "POINT(1 2)");
/// ```
pub trait GeometryConverter {
    /// Convert `geometry` into well-known text.
    fn to_wkt(&self, geometry: &serde_json::Value) -> Result<String, GeometryConversionError>;
}

impl<T: GeometryConverter + ?Sized> GeometryConverter for &T {
    fn to_wkt(&self, geometry: &serde_json::Value) -> Result<String, GeometryConversionError> {
        (**self).to_wkt(geometry)
    }
}
