/*!
 * Autosave database schema.
 *
 * Holds the SQL for the snapshot table and tracks the schema version so
 * databases written by a newer release are refused instead of misread.
 */

use log::{debug, info};
use rusqlite::Connection;

use crate::errors::PersistenceError;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<(), PersistenceError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing autosave schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(PersistenceError::Schema(format!(
            "database schema v{} is newer than supported v{}",
            current_version, SCHEMA_VERSION
        )));
    } else {
        debug!("Autosave schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version, 0 for a fresh database
pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32, PersistenceError> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), PersistenceError> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

fn create_all_tables(conn: &Connection) -> Result<(), PersistenceError> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    // One row per key; items holds the JSON cue array
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS snapshots (
            key TEXT PRIMARY KEY,
            items TEXT NOT NULL,
            digest TEXT NOT NULL,
            saved_at TEXT NOT NULL
        );
        "#,
    )?;

    info!("Autosave schema created successfully");
    Ok(())
}
