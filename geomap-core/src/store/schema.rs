//! SQLite schema backing [`SqliteCatalogue`](super::SqliteCatalogue).
#![forbid(unsafe_code)]

use rusqlite::{Connection, OptionalExtension, Transaction};

use super::sqlite::SqliteCatalogueError;

/// Version recorded in `geomap_schema_version` by this build.
pub const SCHEMA_VERSION: i64 = 1;

/// Create the region and map tables inside `connection` if they are missing.
///
/// Existing databases must already carry [`SCHEMA_VERSION`]; any other
/// recorded version is rejected so migrations can be applied explicitly.
pub(crate) fn initialise_schema(connection: &mut Connection) -> Result<(), SqliteCatalogueError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| SqliteCatalogueError::ForeignKeys { source })?;

    let transaction = connection
        .transaction()
        .map_err(|source| SqliteCatalogueError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SqliteCatalogueError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), SqliteCatalogueError> {
    run_migration_step(
        transaction,
        "create regions",
        "CREATE TABLE IF NOT EXISTS regions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE CHECK (length(trim(code)) > 0),
            name TEXT NOT NULL,
            geometry_wkt TEXT NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "create maps",
        "CREATE TABLE IF NOT EXISTS maps (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "create map_features",
        "CREATE TABLE IF NOT EXISTS map_features (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            map_id INTEGER NOT NULL,
            position INTEGER NOT NULL CHECK (position >= 0),
            region_id INTEGER NOT NULL,
            properties TEXT NOT NULL,
            UNIQUE (map_id, position),
            FOREIGN KEY (map_id) REFERENCES maps(id) ON DELETE CASCADE,
            FOREIGN KEY (region_id) REFERENCES regions(id) ON DELETE RESTRICT
        )",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), SqliteCatalogueError> {
    run_migration_step(
        transaction,
        "index map_features by region",
        "CREATE INDEX IF NOT EXISTS idx_map_features_region
            ON map_features(region_id)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SqliteCatalogueError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS geomap_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM geomap_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SqliteCatalogueError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(SqliteCatalogueError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO geomap_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| SqliteCatalogueError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SqliteCatalogueError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SqliteCatalogueError::Migration { step, source })
}
