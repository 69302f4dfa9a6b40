use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rule applied when an ingested feature refers to a region code that
/// already exists.
///
/// # Examples
/// ```
/// use geomap_core::ConflictPolicy;
///
/// let policy: ConflictPolicy = "update".parse().expect("known policy");
/// assert_eq!(policy, ConflictPolicy::Update);
/// assert_eq!(ConflictPolicy::default(), ConflictPolicy::CreateOnly);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictPolicy {
    /// Reuse the existing region unchanged.
    #[default]
    CreateOnly,
    /// Overwrite the existing region's name and geometry.
    Update,
}

impl ConflictPolicy {
    /// Canonical upper-case spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateOnly => "CREATE_ONLY",
            Self::Update => "UPDATE",
        }
    }

    /// Whether existing regions are overwritten.
    #[must_use]
    pub const fn overwrites(self) -> bool {
        matches!(self, Self::Update)
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a conflict policy name is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown conflict policy {input:?}; expected CREATE_ONLY or UPDATE")]
pub struct ParseConflictPolicyError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for ConflictPolicy {
    type Err = ParseConflictPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalised.as_str() {
            "CREATE_ONLY" => Ok(Self::CreateOnly),
            "UPDATE" => Ok(Self::Update),
            _ => Err(ParseConflictPolicyError {
                input: s.to_owned(),
            }),
        }
    }
}
