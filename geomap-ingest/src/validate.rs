//! Structural validation of GeoJSON feature collections.
//!
//! Validation is pure: it never touches a store, so a batch with a single bad
//! feature is rejected before any lookup or write happens.

use std::collections::BTreeSet;

use geomap_core::Properties;
use log::warn;
use serde_json::Value;

use crate::error::{IngestError, InvalidFeatureReason, MalformedInput};

/// A feature that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFeature {
    /// Zero-based position of the feature in the input.
    pub index: usize,
    /// Region code, as written in the input.
    pub code: String,
    /// Region display name, as written in the input.
    pub name: String,
    /// Raw GeoJSON geometry payload.
    pub geometry: Value,
    /// Verbatim copy of the feature's `properties`, `code` and `name`
    /// included.
    pub properties: Properties,
    /// The feature object exactly as it appeared in the input, foreign
    /// members such as `id` and `bbox` included. Attached to diagnostics.
    pub raw: Value,
}

/// Ordered features of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    features: Vec<ValidatedFeature>,
}

impl FeatureSet {
    /// Features in input order.
    #[must_use]
    pub fn features(&self) -> &[ValidatedFeature] {
        &self.features
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the document had no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over the features in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidatedFeature> {
        self.features.iter()
    }

    /// Every region code referenced by the document, once each.
    #[must_use]
    pub fn distinct_codes(&self) -> BTreeSet<String> {
        self.features
            .iter()
            .map(|feature| feature.code.clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a ValidatedFeature;
    type IntoIter = std::slice::Iter<'a, ValidatedFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Parse `raw` and check every feature, returning them in input order.
///
/// # Errors
/// Returns [`IngestError::MalformedInput`] when the text is not a JSON object
/// with a `features` array, and [`IngestError::InvalidFeature`] for the first
/// feature lacking `properties.code`, `properties.name` or `geometry`.
///
/// # Examples
/// ```
/// use geomap_ingest::validate_geojson;
///
/// let raw = r#"{"features": [{
///     "properties": {"code": "US-CA", "name": "California"},
///     "geometry": {"type": "Point", "coordinates": [-119.4, 36.7]}
/// }]}"#;
/// let features = validate_geojson(raw).expect("valid document");
/// assert_eq!(features.len(), 1);
/// assert!(features.distinct_codes().contains("US-CA"));
/// ```
pub fn validate_geojson(raw: &str) -> Result<FeatureSet, IngestError> {
    let document: Value = serde_json::from_str(raw)
        .map_err(|source| IngestError::malformed(MalformedInput::Parse(source)))?;
    let Value::Object(mut document) = document else {
        return Err(IngestError::malformed(MalformedInput::NotAnObject));
    };
    let items = match document.remove("features") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(IngestError::malformed(MalformedInput::FeaturesNotArray)),
        None => return Err(IngestError::malformed(MalformedInput::MissingFeatures)),
    };

    let features = items
        .into_iter()
        .enumerate()
        .map(|(index, feature)| validate_feature(index, feature))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FeatureSet { features })
}

fn validate_feature(index: usize, feature: Value) -> Result<ValidatedFeature, IngestError> {
    match extract_feature(index, &feature) {
        Ok(validated) => Ok(validated),
        Err(reason) => {
            warn!("rejecting feature {index}: {reason}");
            Err(IngestError::InvalidFeature {
                index,
                reason,
                feature: Box::new(feature),
            })
        }
    }
}

fn extract_feature(
    index: usize,
    feature: &Value,
) -> Result<ValidatedFeature, InvalidFeatureReason> {
    let object = feature.as_object().ok_or(InvalidFeatureReason::NotAnObject)?;
    let properties = object
        .get("properties")
        .and_then(Value::as_object)
        .ok_or(InvalidFeatureReason::MissingProperties)?;
    let code = non_blank(properties, "code").ok_or(InvalidFeatureReason::MissingCode)?;
    let name = non_blank(properties, "name").ok_or(InvalidFeatureReason::MissingName)?;
    let geometry = object
        .get("geometry")
        .filter(|geometry| !geometry.is_null())
        .ok_or(InvalidFeatureReason::MissingGeometry)?;

    Ok(ValidatedFeature {
        index,
        code: code.to_owned(),
        name: name.to_owned(),
        geometry: geometry.clone(),
        properties: properties.clone(),
        raw: feature.clone(),
    })
}

fn non_blank<'a>(properties: &'a Properties, key: &str) -> Option<&'a str> {
    properties
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn feature(code: &str, name: &str) -> Value {
        json!({
            "type": "Feature",
            "properties": {"code": code, "name": name, "population": 1},
            "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
        })
    }

    fn document(features: Vec<Value>) -> String {
        json!({"type": "FeatureCollection", "features": features}).to_string()
    }

    #[rstest]
    fn keeps_input_order_and_properties() {
        let raw = document(vec![feature("US-NY", "New York"), feature("US-CA", "California")]);
        let set = validate_geojson(&raw).expect("valid document");

        let codes: Vec<_> = set.iter().map(|feature| feature.code.as_str()).collect();
        assert_eq!(codes, ["US-NY", "US-CA"]);
        let first = set.features().first().expect("first feature");
        assert_eq!(first.index, 0);
        assert_eq!(first.properties.get("population"), Some(&json!(1)));
        assert_eq!(first.properties.get("code"), Some(&json!("US-NY")));
    }

    #[rstest]
    fn empty_collection_is_valid() {
        let set = validate_geojson(r#"{"features": []}"#).expect("valid document");
        assert!(set.is_empty());
        assert!(set.distinct_codes().is_empty());
    }

    #[rstest]
    fn distinct_codes_collapse_duplicates() {
        let raw = document(vec![
            feature("US-CA", "California"),
            feature("US-NY", "New York"),
            feature("US-CA", "California"),
        ]);
        let set = validate_geojson(&raw).expect("valid document");
        assert_eq!(set.len(), 3);
        assert_eq!(set.distinct_codes().len(), 2);
    }

    #[rstest]
    #[case::not_json("not json", "Parse")]
    #[case::array("[]", "NotAnObject")]
    #[case::missing(r#"{"type": "FeatureCollection"}"#, "MissingFeatures")]
    #[case::not_array(r#"{"features": {}}"#, "FeaturesNotArray")]
    fn rejects_malformed_documents(#[case] raw: &str, #[case] expected: &str) {
        let error = validate_geojson(raw).expect_err("document should be rejected");
        let actual = match error {
            IngestError::MalformedInput { reason } => match reason {
                MalformedInput::Parse(_) => "Parse",
                MalformedInput::NotAnObject => "NotAnObject",
                MalformedInput::MissingFeatures => "MissingFeatures",
                MalformedInput::FeaturesNotArray => "FeaturesNotArray",
            },
            other => panic!("expected malformed input, got {other:?}"),
        };
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::not_object(json!("feature"), InvalidFeatureReason::NotAnObject)]
    #[case::no_properties(
        json!({"geometry": {"type": "Point", "coordinates": [0, 0]}}),
        InvalidFeatureReason::MissingProperties
    )]
    #[case::no_code(
        json!({"properties": {"name": "X"}, "geometry": {"type": "Point", "coordinates": [0, 0]}}),
        InvalidFeatureReason::MissingCode
    )]
    #[case::blank_code(
        json!({"properties": {"code": "  ", "name": "X"}, "geometry": {"type": "Point", "coordinates": [0, 0]}}),
        InvalidFeatureReason::MissingCode
    )]
    #[case::numeric_name(
        json!({"properties": {"code": "X", "name": 7}, "geometry": {"type": "Point", "coordinates": [0, 0]}}),
        InvalidFeatureReason::MissingName
    )]
    #[case::null_geometry(
        json!({"properties": {"code": "X", "name": "X"}, "geometry": null}),
        InvalidFeatureReason::MissingGeometry
    )]
    #[case::no_geometry(
        json!({"properties": {"code": "X", "name": "X"}}),
        InvalidFeatureReason::MissingGeometry
    )]
    fn rejects_invalid_features(#[case] bad: Value, #[case] expected: InvalidFeatureReason) {
        let raw = document(vec![feature("US-CA", "California"), bad.clone()]);
        let error = validate_geojson(&raw).expect_err("feature should be rejected");
        match error {
            IngestError::InvalidFeature {
                index,
                reason,
                feature,
            } => {
                assert_eq!(index, 1);
                assert_eq!(reason, expected);
                assert_eq!(*feature, bad);
            }
            other => panic!("expected invalid feature, got {other:?}"),
        }
    }

    #[rstest]
    fn keeps_the_input_feature_with_foreign_members() {
        let mut input = feature("US-CA", "California");
        input["id"] = json!("ca-1");
        input["bbox"] = json!([-124.4, 32.5, -114.1, 42.0]);
        let raw = document(vec![input.clone()]);
        let set = validate_geojson(&raw).expect("valid document");

        let kept = &set.features().first().expect("feature").raw;
        assert_eq!(*kept, input);
        assert_eq!(kept["id"], "ca-1");
        assert_eq!(kept["geometry"]["type"], "Point");
    }
}
