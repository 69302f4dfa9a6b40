//! Errors and batch stages reported by map ingestion.

use std::fmt;

use geomap_core::{GeometryConversionError, StoreError};
use serde_json::Value;
use thiserror::Error;

/// Stage of a single ingestion batch.
///
/// A batch moves through the stages in declaration order and ends in either
/// [`BatchStage::Committed`] or [`BatchStage::Aborted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchStage {
    /// Checking the map name and the GeoJSON document. No store access.
    Validating,
    /// Looking up, creating and updating regions.
    Resolving,
    /// Pairing resolved regions with feature properties.
    Assembling,
    /// Writing the map and committing the transaction.
    Committing,
    /// The batch is durable.
    Committed,
    /// The batch failed and every write was rolled back.
    Aborted,
}

impl BatchStage {
    /// Lower-case label used in log lines and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Resolving => "resolving",
            Self::Assembling => "assembling",
            Self::Committing => "committing",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a document was rejected before any feature was inspected.
#[derive(Debug, Error)]
pub enum MalformedInput {
    /// The text is not JSON.
    #[error("input is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    /// The top-level value is not an object.
    #[error("document must be a JSON object")]
    NotAnObject,
    /// The document has no `features` member.
    #[error("missing required collection `features`")]
    MissingFeatures,
    /// `features` is present but is not an array.
    #[error("`features` must be an array")]
    FeaturesNotArray,
}

/// Why a single feature was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidFeatureReason {
    /// The feature is not a JSON object.
    #[error("feature must be a JSON object")]
    NotAnObject,
    /// `properties` is absent or not an object.
    #[error("feature has no `properties` object")]
    MissingProperties,
    /// `properties.code` is absent, blank or not a string.
    #[error("feature has no region `code`")]
    MissingCode,
    /// `properties.name` is absent, blank or not a string.
    #[error("feature has no region `name`")]
    MissingName,
    /// `geometry` is absent or null.
    #[error("feature has no `geometry`")]
    MissingGeometry,
}

/// Errors returned by [`create_map`](crate::create_map) and its stages.
///
/// Every variant aborts the whole batch; nothing is written when one is
/// returned.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The document could not be read as a feature collection.
    #[error("malformed GeoJSON input: {reason}")]
    MalformedInput {
        /// What was wrong with the document.
        #[source]
        reason: MalformedInput,
    },
    /// A feature is missing a required member.
    #[error("feature {index} is invalid: {reason}")]
    InvalidFeature {
        /// Zero-based position of the feature in the input.
        index: usize,
        /// Which member was missing.
        #[source]
        reason: InvalidFeatureReason,
        /// The offending feature as it appeared in the input.
        feature: Box<Value>,
    },
    /// The map name is empty or whitespace.
    #[error("map name must not be blank")]
    InvalidMapName,
    /// A feature's geometry could not be converted to well-known text.
    #[error("failed to convert geometry of feature {index} (region {code:?}): {source}")]
    GeometryConversion {
        /// Zero-based position of the feature in the input.
        index: usize,
        /// Region code carried by the feature.
        code: String,
        /// The offending feature.
        feature: Box<Value>,
        /// Error reported by the converter.
        #[source]
        source: GeometryConversionError,
    },
    /// The store failed.
    #[error("store failure while {stage}: {source}")]
    Persistence {
        /// Stage during which the store failed.
        stage: BatchStage,
        /// Error reported by the store.
        #[source]
        source: StoreError,
    },
}

impl IngestError {
    /// Stage during which the batch failed.
    ///
    /// # Examples
    /// ```
    /// use geomap_ingest::{BatchStage, IngestError};
    ///
    /// assert_eq!(IngestError::InvalidMapName.stage(), BatchStage::Validating);
    /// ```
    #[must_use]
    pub const fn stage(&self) -> BatchStage {
        match self {
            Self::MalformedInput { .. } | Self::InvalidFeature { .. } | Self::InvalidMapName => {
                BatchStage::Validating
            }
            Self::GeometryConversion { .. } => BatchStage::Resolving,
            Self::Persistence { stage, .. } => *stage,
        }
    }

    pub(crate) fn malformed(reason: MalformedInput) -> Self {
        Self::MalformedInput { reason }
    }

    pub(crate) fn persistence(stage: BatchStage) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Persistence { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BatchStage::Validating, "validating")]
    #[case(BatchStage::Committing, "committing")]
    #[case(BatchStage::Aborted, "aborted")]
    fn stage_labels(#[case] stage: BatchStage, #[case] expected: &str) {
        assert_eq!(stage.to_string(), expected);
    }

    #[rstest]
    fn persistence_errors_keep_their_stage() {
        let error = IngestError::persistence(BatchStage::Committing)(StoreError::DuplicateCode {
            code: "US-CA".to_owned(),
        });
        assert_eq!(error.stage(), BatchStage::Committing);
        assert_eq!(
            error.to_string(),
            "store failure while committing: region code \"US-CA\" already exists"
        );
    }
}
