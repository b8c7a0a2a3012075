//! SQLite schema for the local store
//!
//! Each collection is a `(key, record)` table. Migrations are additive:
//! a newer version only creates what is missing and never drops data.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use super::error::{StorageError, StorageResult};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

struct Migration {
    version: i32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: r#"
        CREATE TABLE IF NOT EXISTS books (
            key TEXT PRIMARY KEY NOT NULL,
            record BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reviews (
            key INTEGER PRIMARY KEY AUTOINCREMENT,
            record BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS annotations (
            key INTEGER PRIMARY KEY AUTOINCREMENT,
            record BLOB NOT NULL
        );
        "#,
    },
    Migration {
        version: 2,
        sql: r#"
        CREATE TABLE IF NOT EXISTS tags (
            key TEXT PRIMARY KEY NOT NULL,
            record BLOB NOT NULL
        );
        "#,
    },
];

/// Bring the schema up to `SCHEMA_VERSION`
///
/// Idempotent: running it on an up-to-date database does nothing.
pub fn init_schema(conn: &mut Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )?;

    let current = get_schema_version(conn)?.unwrap_or(0);
    if current > SCHEMA_VERSION {
        return Err(StorageError::UpgradeBlocked {
            found: current,
            supported: SCHEMA_VERSION,
        });
    }
    if current == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)?;
        info!("Applied store migration v{}", migration.version);
    }
    tx.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;
    tx.commit()?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> StorageResult<Option<i32>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_info WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(value.and_then(|v| v.parse().ok()))
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}
