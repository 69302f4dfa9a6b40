use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned identity of a [`Region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub i64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A uniquely coded geographic area.
///
/// `code` is the stable external key and is unique across a store. The
/// geometry is held as well-known text derived from the ingested GeoJSON.
///
/// # Examples
/// ```
/// use geomap_core::{Region, RegionDraft, RegionId};
///
/// let draft = RegionDraft::new("US-CA", "California", "POINT(-119.4 36.7)");
/// let region = draft.into_region(RegionId(1));
///
/// assert_eq!(region.code, "US-CA");
/// assert_eq!(region.id, RegionId(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Identity assigned by the store.
    pub id: RegionId,
    /// Unique external code, for example `US-CA`.
    pub code: String,
    /// Human-readable display name.
    pub name: String,
    /// Geometry in well-known text.
    pub geometry_wkt: String,
}

impl Region {
    /// Overwrite the mutable attributes in place, keeping identity and code.
    pub fn overwrite(&mut self, name: impl Into<String>, geometry_wkt: impl Into<String>) {
        self.name = name.into();
        self.geometry_wkt = geometry_wkt.into();
    }
}

/// A region that has not been persisted yet and therefore has no identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDraft {
    /// Unique external code.
    pub code: String,
    /// Human-readable display name.
    pub name: String,
    /// Geometry in well-known text.
    pub geometry_wkt: String,
}

impl RegionDraft {
    /// Construct a draft from its attributes.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        geometry_wkt: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            geometry_wkt: geometry_wkt.into(),
        }
    }

    /// Attach the identity assigned by a store.
    #[must_use]
    pub fn into_region(self, id: RegionId) -> Region {
        Region {
            id,
            code: self.code,
            name: self.name,
            geometry_wkt: self.geometry_wkt,
        }
    }
}
