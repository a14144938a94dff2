/*!
 * Snapshot persistence backends.
 *
 * [`SnapshotStore`] is the seam between the autosaver and its storage;
 * [`SqliteSnapshotStore`] keeps snapshots in a local SQLite file behind a
 * thread-safe connection wrapper.
 */

use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::schema;
use super::SavedSnapshot;
use crate::app_config::AutosaveConfig;
use crate::errors::PersistenceError;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "autosave.db";

/// Default database directory name under the user's data directory
const DEFAULT_DB_DIRNAME: &str = "subedit";

/// Key-value storage for whole-store snapshots
pub trait SnapshotStore: Send {
    /// Insert or replace the snapshot under `key`
    fn put(&self, key: &str, snapshot: &SavedSnapshot) -> Result<(), PersistenceError>;

    /// Snapshot under `key`, if any
    fn get(&self, key: &str) -> Result<Option<SavedSnapshot>, PersistenceError>;

    /// Delete the snapshot under `key`; returns whether one existed
    fn remove(&self, key: &str) -> Result<bool, PersistenceError>;
}

/// SQLite-backed snapshot store
#[derive(Clone)]
pub struct SqliteSnapshotStore {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl SqliteSnapshotStore {
    /// Open the store at the default location
    pub fn new_default() -> Result<Self, PersistenceError> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Open the configured database, or the default one when no path is set
    pub fn from_config(config: &AutosaveConfig) -> Result<Self, PersistenceError> {
        match &config.database_path {
            Some(path) => Self::new(path),
            None => Self::new_default(),
        }
    }

    /// Open or create the store at `db_path`
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, PersistenceError> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening autosave database at: {:?}", db_path);

        let conn = Connection::open(&db_path)?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store (for testing)
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        debug!("Creating in-memory autosave database");

        let conn = Connection::open_in_memory()?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Default database path under the user's local data directory
    pub fn default_database_path() -> Result<PathBuf, PersistenceError> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or(PersistenceError::NoDataDir)?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run `f` with the locked connection
    pub fn execute<F, T>(&self, f: F) -> Result<T, PersistenceError>
    where
        F: FnOnce(&Connection) -> Result<T, PersistenceError>,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|e| PersistenceError::Lock(e.to_string()))?;

        f(&conn)
    }

    /// Number of stored snapshots
    pub fn count(&self) -> Result<usize, PersistenceError> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
            Ok(count.max(0) as usize)
        })
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn put(&self, key: &str, snapshot: &SavedSnapshot) -> Result<(), PersistenceError> {
        let items = serde_json::to_string(&snapshot.items)?;
        self.execute(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO snapshots (key, items, digest, saved_at) VALUES (?1, ?2, ?3, ?4)",
                params![key, items, snapshot.digest, snapshot.saved_at.to_rfc3339()],
            )?;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> Result<Option<SavedSnapshot>, PersistenceError> {
        let row = self.execute(|conn| {
            Ok(conn
                .query_row(
                    "SELECT items, digest, saved_at FROM snapshots WHERE key = ?1",
                    [key],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
                )
                .optional()?)
        })?;

        let Some((items, digest, saved_at)) = row else {
            return Ok(None);
        };

        let saved_at = DateTime::parse_from_rfc3339(&saved_at)
            .map_err(|e| PersistenceError::Timestamp(format!("{}: {}", saved_at, e)))?
            .with_timezone(&Utc);

        Ok(Some(SavedSnapshot {
            items: serde_json::from_str(&items)?,
            saved_at,
            digest,
        }))
    }

    fn remove(&self, key: &str) -> Result<bool, PersistenceError> {
        self.execute(|conn| {
            let removed = conn.execute("DELETE FROM snapshots WHERE key = ?1", [key])?;
            Ok(removed > 0)
        })
    }
}
