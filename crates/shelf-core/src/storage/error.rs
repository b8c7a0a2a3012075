//! Storage error handling
//!
//! Provides typed errors for store operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

use super::Collection;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing the database
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied { path: PathBuf },

    /// Disk is full or quota exceeded
    #[error("Storage quota exceeded: {details}. Free up disk space and try again.")]
    QuotaExceeded { details: String },

    /// Another connection holds the database
    #[error("Database is busy or locked: {details}")]
    Busy { details: String },

    /// The database file itself is damaged
    #[error("Database file is corrupted: {details}")]
    CorruptDatabase { details: String },

    /// Stored schema is newer than this binary understands
    #[error("Schema upgrade blocked: database is at version {found}, this build supports up to {supported}")]
    UpgradeBlocked { found: i32, supported: i32 },

    /// A record could not be decoded
    #[error("Corrupt record '{key}' in {collection}: {details}")]
    CorruptRecord {
        collection: Collection,
        key: String,
        details: String,
    },

    /// A record could not be encoded
    #[error("Failed to encode record for {collection}: {details}")]
    Encode {
        collection: Collection,
        details: String,
    },

    /// Record has no key and the collection does not generate one
    #[error("Record for {collection} is missing its key")]
    MissingKey { collection: Collection },

    /// `add` on a key that already exists
    #[error("Record '{key}' already exists in {collection}")]
    KeyExists { collection: Collection, key: String },

    /// Operation on a collection the transaction was not opened for
    #[error("Collection {collection} is not in this transaction's scope")]
    OutOfScope { collection: Collection },

    /// Write inside a read-only transaction
    #[error("Cannot write to {collection} in a read-only transaction")]
    ReadOnly { collection: Collection },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<rusqlite::Error> for StorageError {
    fn from(error: rusqlite::Error) -> Self {
        StorageError::from_sqlite(error)
    }
}

impl StorageError {
    /// Classify a SQLite error by its extended code
    pub fn from_sqlite(error: rusqlite::Error) -> Self {
        let code = error.sqlite_error_code();
        match code {
            Some(ErrorCode::DiskFull) => StorageError::QuotaExceeded {
                details: error.to_string(),
            },
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                StorageError::Busy {
                    details: error.to_string(),
                }
            }
            Some(ErrorCode::DatabaseCorrupt) | Some(ErrorCode::NotADatabase) => {
                StorageError::CorruptDatabase {
                    details: error.to_string(),
                }
            }
            _ => StorageError::Database(error),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::QuotaExceeded { .. }
                | StorageError::PermissionDenied { .. }
                | StorageError::Busy { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::QuotaExceeded { .. } => Some("Free up disk space and try again."),
            StorageError::PermissionDenied { .. } => {
                Some("Check file and directory permissions for the data directory.")
            }
            StorageError::Busy { .. } => {
                Some("Close other shelf processes using the same data directory and retry.")
            }
            StorageError::UpgradeBlocked { .. } => {
                Some("This database was written by a newer version of shelf. Upgrade shelf to open it.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            _ => None,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
