//! End-to-end ingestion into an on-disk SQLite catalogue.

mod support;

use geomap_core::{Catalogue, ConflictPolicy, SqliteCatalogue};
use geomap_ingest::{IngestError, MapIngestor, WktConverter, create_map};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use support::{document, document_for_codes, feature, feature_with_geometry};

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

#[rstest]
fn maps_survive_reopening(temp_dir: TempDir) {
    let path = temp_dir.path().join("geomap.db");
    let map = {
        let mut catalogue = SqliteCatalogue::open(&path).expect("open catalogue");
        create_map(
            &mut catalogue,
            WktConverter,
            "States",
            &document_for_codes(["US-CA", "US-NY", "US-CA"]),
            ConflictPolicy::CreateOnly,
        )
        .expect("ingest")
    };

    let reopened = SqliteCatalogue::open(&path).expect("reopen catalogue");
    let loaded = reopened
        .load_map(map.id)
        .expect("load map")
        .expect("map exists");
    assert_eq!(loaded, map);
    let region = loaded.features.first().expect("first feature").region.clone();
    assert_eq!(region.geometry_wkt, "POINT(0 0)");
    assert_eq!(
        loaded.features.first().map(|f| &f.properties["source"]),
        Some(&serde_json::json!("test"))
    );
}

#[rstest]
fn repeated_ingest_reuses_region_identities() {
    let catalogue = SqliteCatalogue::open_in_memory().expect("open catalogue");
    let mut ingestor = MapIngestor::new(catalogue, WktConverter);
    let raw = document_for_codes(["US-CA", "US-NY"]);

    let first = ingestor
        .create_map("First", &raw, ConflictPolicy::CreateOnly)
        .expect("first ingest");
    let second = ingestor
        .create_map("Second", &raw, ConflictPolicy::CreateOnly)
        .expect("second ingest");

    assert_ne!(first.id, second.id);
    assert_eq!(first.region_ids(), second.region_ids());
}

#[rstest]
#[case(ConflictPolicy::CreateOnly, "California")]
#[case(ConflictPolicy::Update, "Golden State")]
fn conflict_policy_controls_overwrites(#[case] policy: ConflictPolicy, #[case] expected: &str) {
    let mut catalogue = SqliteCatalogue::open_in_memory().expect("open catalogue");
    create_map(
        &mut catalogue,
        WktConverter,
        "Before",
        &document(vec![feature("US-CA", "California")]),
        ConflictPolicy::CreateOnly,
    )
    .expect("seed ingest");

    let map = create_map(
        &mut catalogue,
        WktConverter,
        "After",
        &document(vec![feature("US-CA", "Golden State")]),
        policy,
    )
    .expect("second ingest");

    let stored = catalogue
        .region_by_code("US-CA")
        .expect("lookup")
        .expect("region exists");
    assert_eq!(stored.name, expected);
    assert_eq!(
        map.features.first().map(|f| f.region.name.as_str()),
        Some(expected)
    );
}

#[rstest]
fn geometry_failure_leaves_no_regions_behind() {
    let mut catalogue = SqliteCatalogue::open_in_memory().expect("open catalogue");
    let raw = document(vec![
        feature("US-CA", "California"),
        feature_with_geometry("US-NY", "New York", "Circle"),
    ]);

    let error = create_map(
        &mut catalogue,
        WktConverter,
        "States",
        &raw,
        ConflictPolicy::CreateOnly,
    )
    .expect_err("conversion fails");

    assert!(matches!(
        error,
        IngestError::GeometryConversion { index: 1, .. }
    ));
    assert!(
        catalogue
            .region_by_code("US-CA")
            .expect("lookup")
            .is_none(),
        "region created before the failure should be rolled back"
    );
}

#[rstest]
fn empty_collection_creates_empty_map() {
    let mut catalogue = SqliteCatalogue::open_in_memory().expect("open catalogue");
    let map = create_map(
        &mut catalogue,
        WktConverter,
        "Nothing",
        &document(Vec::new()),
        ConflictPolicy::Update,
    )
    .expect("ingest");

    assert!(map.features.is_empty());
    assert_eq!(
        catalogue.load_map(map.id).expect("load").map(|m| m.name),
        Some("Nothing".to_owned())
    );
}
