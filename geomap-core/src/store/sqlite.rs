//! SQLite-backed catalogue of regions and maps.

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use rusqlite::{
    Connection, Error as SqliteError, ErrorCode, OptionalExtension, Row, Transaction,
    TransactionBehavior, ffi, params_from_iter,
};
use thiserror::Error;

use crate::{
    FeatureId, GeoMap, MapFeature, MapFeatureDraft, MapId, Properties, Region, RegionDraft,
    RegionId,
};

use super::schema::initialise_schema;
use super::{Catalogue, CatalogueTransaction, MapStore, RegionStore, StoreError};

/// SQLite limits bound parameters per statement to 999 by default. Bulk
/// lookups chunk their `IN` lists to remain below that ceiling.
const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

/// Busy timeout applied to file-backed connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const REGION_COLUMNS: &str = "id, code, name, geometry_wkt";

/// Errors raised while opening a [`SqliteCatalogue`].
#[derive(Debug, Error)]
pub enum SqliteCatalogueError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Configuring the busy timeout failed.
    #[error("failed to configure SQLite busy timeout")]
    BusyTimeout {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Enabling SQLite foreign keys failed.
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A schema migration step failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Name of the failed step.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The database carries a schema version this build does not understand.
    #[error(
        "expected geomap schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch {
        /// Version supported by this build.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
}

/// Region and map catalogue persisted in a SQLite database.
pub struct SqliteCatalogue {
    connection: Connection,
}

impl fmt::Debug for SqliteCatalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCatalogue")
            .field("path", &self.connection.path())
            .finish_non_exhaustive()
    }
}

impl SqliteCatalogue {
    /// Open (or create) a catalogue at `path` using [`DEFAULT_BUSY_TIMEOUT`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteCatalogueError> {
        Self::open_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open (or create) a catalogue at `path`, waiting at most `timeout` for
    /// competing writers to release their locks.
    pub fn open_with_busy_timeout<P: AsRef<Path>>(
        path: P,
        timeout: Duration,
    ) -> Result<Self, SqliteCatalogueError> {
        let path = path.as_ref();
        let connection =
            Connection::open(path).map_err(|source| SqliteCatalogueError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        connection
            .busy_timeout(timeout)
            .map_err(|source| SqliteCatalogueError::BusyTimeout { source })?;
        Self::from_connection(connection)
    }

    /// Create a catalogue backed by a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqliteCatalogueError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteCatalogueError::OpenDatabase {
                path: PathBuf::from(":memory:"),
                source,
            })?;
        Self::from_connection(connection)
    }

    /// Wrap an existing connection, initialising the schema when missing.
    pub fn from_connection(mut connection: Connection) -> Result<Self, SqliteCatalogueError> {
        initialise_schema(&mut connection)?;
        Ok(Self { connection })
    }
}

impl Catalogue for SqliteCatalogue {
    fn begin(&mut self) -> Result<Box<dyn CatalogueTransaction + '_>, StoreError> {
        // Take the write lock up front so a competing writer fails on begin
        // rather than midway through the batch.
        let transaction = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|source| StoreError::backend("begin transaction", source))?;
        Ok(Box::new(SqliteCatalogueTransaction { transaction }))
    }

    fn load_map(&self, id: MapId) -> Result<Option<GeoMap>, StoreError> {
        load_map(&self.connection, id)
    }

    fn region_by_code(&self, code: &str) -> Result<Option<Region>, StoreError> {
        let query = format!("SELECT {REGION_COLUMNS} FROM regions WHERE code = ?1");
        self.connection
            .query_row(&query, [code], region_from_row)
            .optional()
            .map_err(|source| StoreError::backend("look up region by code", source))
    }
}

struct SqliteCatalogueTransaction<'conn> {
    transaction: Transaction<'conn>,
}

impl RegionStore for SqliteCatalogueTransaction<'_> {
    fn bulk_fetch_by_code(
        &mut self,
        codes: &BTreeSet<String>,
    ) -> Result<HashMap<String, Region>, StoreError> {
        let codes: Vec<&str> = codes.iter().map(String::as_str).collect();
        let mut regions = HashMap::with_capacity(codes.len());
        for chunk in codes.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            for region in load_regions_chunk(&self.transaction, chunk)? {
                regions.insert(region.code.clone(), region);
            }
        }
        Ok(regions)
    }

    fn create_region(&mut self, draft: RegionDraft) -> Result<Region, StoreError> {
        let inserted = self.transaction.execute(
            "INSERT INTO regions (code, name, geometry_wkt) VALUES (?1, ?2, ?3)",
            (
                draft.code.as_str(),
                draft.name.as_str(),
                draft.geometry_wkt.as_str(),
            ),
        );
        match inserted {
            Ok(_) => {
                let id = RegionId(self.transaction.last_insert_rowid());
                Ok(draft.into_region(id))
            }
            Err(source) if is_unique_violation(&source) => {
                Err(StoreError::DuplicateCode { code: draft.code })
            }
            Err(source) => Err(StoreError::backend("insert region", source)),
        }
    }

    fn update_region(&mut self, region: &Region) -> Result<(), StoreError> {
        let updated = self
            .transaction
            .execute(
                "UPDATE regions SET name = ?1, geometry_wkt = ?2 WHERE id = ?3",
                (
                    region.name.as_str(),
                    region.geometry_wkt.as_str(),
                    region.id.0,
                ),
            )
            .map_err(|source| StoreError::backend("update region", source))?;
        if updated == 0 {
            return Err(StoreError::UnknownRegion { id: region.id });
        }
        Ok(())
    }
}

impl MapStore for SqliteCatalogueTransaction<'_> {
    fn create_map(
        &mut self,
        name: &str,
        features: Vec<MapFeatureDraft>,
    ) -> Result<GeoMap, StoreError> {
        self.transaction
            .execute("INSERT INTO maps (name) VALUES (?1)", [name])
            .map_err(|source| StoreError::backend("insert map", source))?;
        let map_id = MapId(self.transaction.last_insert_rowid());

        let mut regions: HashMap<RegionId, Region> = HashMap::new();
        let mut persisted = Vec::with_capacity(features.len());
        {
            let mut insert_feature = self
                .transaction
                .prepare_cached(
                    "INSERT INTO map_features (map_id, position, region_id, properties)
                        VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|source| StoreError::backend("prepare feature insert", source))?;

            for (index, draft) in features.into_iter().enumerate() {
                let position = u32::try_from(index)
                    .map_err(|source| StoreError::backend("number map features", source))?;
                let region = match regions.get(&draft.region_id) {
                    Some(region) => region.clone(),
                    None => {
                        let region = load_region_by_id(&self.transaction, draft.region_id)?;
                        regions.insert(region.id, region.clone());
                        region
                    }
                };
                let properties = serde_json::to_string(&draft.properties)
                    .map_err(|source| StoreError::backend("serialise feature properties", source))?;
                insert_feature
                    .execute((map_id.0, position, region.id.0, properties))
                    .map_err(|source| StoreError::backend("insert map feature", source))?;
                persisted.push(MapFeature {
                    id: FeatureId(self.transaction.last_insert_rowid()),
                    position,
                    region,
                    properties: draft.properties,
                });
            }
        }

        Ok(GeoMap {
            id: map_id,
            name: name.to_owned(),
            features: persisted,
        })
    }
}

impl CatalogueTransaction for SqliteCatalogueTransaction<'_> {
    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.transaction
            .commit()
            .map_err(|source| StoreError::backend("commit transaction", source))
    }
}

fn is_unique_violation(error: &SqliteError) -> bool {
    matches!(
        error,
        SqliteError::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn region_from_row(row: &Row<'_>) -> rusqlite::Result<Region> {
    Ok(Region {
        id: RegionId(row.get(0)?),
        code: row.get(1)?,
        name: row.get(2)?,
        geometry_wkt: row.get(3)?,
    })
}

fn load_regions_chunk(connection: &Connection, codes: &[&str]) -> Result<Vec<Region>, StoreError> {
    if codes.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; codes.len()].join(", ");
    let query = format!("SELECT {REGION_COLUMNS} FROM regions WHERE code IN ({placeholders})");
    let mut statement = connection
        .prepare(&query)
        .map_err(|source| StoreError::backend("prepare region lookup", source))?;
    let rows = statement
        .query_map(params_from_iter(codes.iter()), region_from_row)
        .map_err(|source| StoreError::backend("look up regions", source))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|source| StoreError::backend("read region row", source))
}

fn load_region_by_id(connection: &Connection, id: RegionId) -> Result<Region, StoreError> {
    let query = format!("SELECT {REGION_COLUMNS} FROM regions WHERE id = ?1");
    connection
        .query_row(&query, [id.0], region_from_row)
        .optional()
        .map_err(|source| StoreError::backend("look up region by id", source))?
        .ok_or(StoreError::UnknownRegion { id })
}

fn load_map(connection: &Connection, id: MapId) -> Result<Option<GeoMap>, StoreError> {
    let name: Option<String> = connection
        .query_row("SELECT name FROM maps WHERE id = ?1", [id.0], |row| row.get(0))
        .optional()
        .map_err(|source| StoreError::backend("look up map", source))?;
    let Some(name) = name else {
        return Ok(None);
    };

    let mut statement = connection
        .prepare(
            "SELECT f.id, f.position, f.properties, r.id, r.code, r.name, r.geometry_wkt
                FROM map_features AS f
                JOIN regions AS r ON r.id = f.region_id
                WHERE f.map_id = ?1
                ORDER BY f.position",
        )
        .map_err(|source| StoreError::backend("prepare feature lookup", source))?;
    let mut rows = statement
        .query([id.0])
        .map_err(|source| StoreError::backend("look up map features", source))?;

    let mut features = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|source| StoreError::backend("read map feature row", source))?
    {
        features.push(feature_from_row(row)?);
    }

    Ok(Some(GeoMap { id, name, features }))
}

fn feature_from_row(row: &Row<'_>) -> Result<MapFeature, StoreError> {
    let read = |source: SqliteError| StoreError::backend("read map feature column", source);
    let properties_json: String = row.get(2).map_err(read)?;
    let properties: Properties = serde_json::from_str(&properties_json)
        .map_err(|source| StoreError::backend("parse feature properties", source))?;
    Ok(MapFeature {
        id: FeatureId(row.get(0).map_err(read)?),
        position: row.get(1).map_err(read)?,
        region: Region {
            id: RegionId(row.get(3).map_err(read)?),
            code: row.get(4).map_err(read)?,
            name: row.get(5).map_err(read)?,
            geometry_wkt: row.get(6).map_err(read)?,
        },
        properties,
    })
}
