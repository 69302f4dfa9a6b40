//! Workspace and GeoJSON builders shared by the CLI tests.

use std::cell::RefCell;

use camino::{Utf8Path, Utf8PathBuf};
use geomap_core::Catalogue;
use geomap_core::test_support::MemoryCatalogue;
use serde_json::json;
use tempfile::TempDir;

use crate::CliError;
use crate::catalogue::CatalogueOpener;

pub(super) fn temp_root() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write file");
}

/// Serialise a FeatureCollection with one point feature per `(code, name)`.
pub(super) fn feature_collection(features: &[(&str, &str)]) -> String {
    let features: Vec<_> = features
        .iter()
        .map(|(code, name)| {
            json!({
                "type": "Feature",
                "properties": {"code": code, "name": name},
                "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features}).to_string()
}

/// Hands out a prepared in-memory catalogue exactly once.
pub(super) struct MemoryCatalogueOpener {
    catalogue: RefCell<Option<MemoryCatalogue>>,
    opened: RefCell<Vec<Utf8PathBuf>>,
}

impl MemoryCatalogueOpener {
    pub(super) fn new(catalogue: MemoryCatalogue) -> Self {
        Self {
            catalogue: RefCell::new(Some(catalogue)),
            opened: RefCell::new(Vec::new()),
        }
    }

    pub(super) fn opened(&self) -> Vec<Utf8PathBuf> {
        self.opened.borrow().clone()
    }
}

impl CatalogueOpener for MemoryCatalogueOpener {
    fn open(&self, path: &Utf8Path) -> Result<Box<dyn Catalogue>, CliError> {
        self.opened.borrow_mut().push(path.to_path_buf());
        let catalogue = self
            .catalogue
            .borrow_mut()
            .take()
            .expect("catalogue opened once");
        Ok(Box::new(catalogue))
    }
}
