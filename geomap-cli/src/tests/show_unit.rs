//! Unit tests for the show command.

use super::helpers::{feature_collection, temp_root};
use super::*;
use crate::catalogue::SqliteCatalogueOpener;
use crate::show::{ShowArgs, ShowConfig, run_show_with};
use camino::Utf8PathBuf;
use geomap_core::{ConflictPolicy, MapId, SqliteCatalogue};
use geomap_ingest::WktConverter;
use rstest::rstest;
use tempfile::TempDir;

fn seeded_database() -> (TempDir, Utf8PathBuf, GeoMap) {
    let (tmp, root) = temp_root();
    let database = root.join("geomap.db");
    let mut catalogue = SqliteCatalogue::open(database.as_std_path()).expect("open catalogue");
    let map = geomap_ingest::create_map(
        &mut catalogue,
        WktConverter,
        "States",
        &feature_collection(&[("US-CA", "California"), ("US-CA", "California")]),
        ConflictPolicy::CreateOnly,
    )
    .expect("seed map");
    (tmp, database, map)
}

#[rstest]
fn converting_show_without_id_errors() {
    let err = ShowConfig::try_from(ShowArgs::default()).expect_err("missing id should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_SHOW_MAP_ID);
            assert_eq!(env, ENV_SHOW_MAP_ID);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn show_config_defaults_database() {
    let args = ShowArgs {
        map_id: Some(3),
        database: None,
    };

    let config = ShowConfig::try_from(args).expect("config should build");
    assert_eq!(config.map_id, MapId(3));
    assert_eq!(config.database, Utf8PathBuf::from(DEFAULT_DATABASE));
}

#[rstest]
fn show_prints_a_stored_map() {
    let (_tmp, database, map) = seeded_database();
    let args = ShowArgs {
        map_id: Some(map.id.0),
        database: Some(database),
    };
    let mut stdout = Vec::new();

    run_show_with(args, &SqliteCatalogueOpener, &mut stdout).expect("show succeeds");

    let shown: GeoMap = serde_json::from_slice(&stdout).expect("output should be a JSON map");
    assert_eq!(shown, map);
    assert_eq!(shown.region_ids().len(), 1);
}

#[rstest]
fn show_reports_unknown_maps() {
    let (_tmp, database, map) = seeded_database();
    let missing = MapId(map.id.0 + 100);
    let args = ShowArgs {
        map_id: Some(missing.0),
        database: Some(database.clone()),
    };
    let mut stdout = Vec::new();

    let err = run_show_with(args, &SqliteCatalogueOpener, &mut stdout).expect_err("no such map");
    match err {
        CliError::MapNotFound { id, path } => {
            assert_eq!(id, missing);
            assert_eq!(path, database);
        }
        other => panic!("expected MapNotFound, found {other:?}"),
    }
    assert!(stdout.is_empty());
}

#[rstest]
fn show_does_not_create_a_missing_database() {
    let (_tmp, root) = temp_root();
    let database = root.join("absent.db");
    let args = ShowArgs {
        map_id: Some(1),
        database: Some(database.clone()),
    };
    let mut stdout = Vec::new();

    let err = run_show_with(args, &SqliteCatalogueOpener, &mut stdout)
        .expect_err("missing database should error");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_DATABASE),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
    assert!(!database.exists());
}
