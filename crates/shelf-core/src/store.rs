//! Local store
//!
//! The `Store` is the session handle over the SQLite database. Every
//! operation runs inside a [`Transaction`] scoped to named collections and
//! a declared [`TxMode`]; a transaction's writes become visible to later
//! transactions when it commits, and are rolled back if it is dropped.
//!
//! The store performs no retries: every failure is returned to the caller.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open(&config)?;
//!
//! let mut tx = store.transaction(&[Collection::Books], TxMode::ReadWrite)?;
//! tx.add(&mut book)?;
//! tx.commit()?;
//!
//! let book: Option<Book> = store.get(&id)?;
//! ```

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use crate::config::Config;
use crate::storage::{
    decode, encode, init_schema, needs_init, Collection, Record, StorageError, StorageResult,
    TxMode,
};

/// Session handle over the local database
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store described by the configuration
    ///
    /// Creates the database and any missing collections on first use.
    pub fn open(config: &Config) -> StorageResult<Self> {
        Self::open_path(&config.database_path())
    }

    /// Open (or create) the store at a specific path
    pub fn open_path(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| {
                if source.kind() == std::io::ErrorKind::PermissionDenied {
                    StorageError::PermissionDenied {
                        path: parent.to_path_buf(),
                    }
                } else {
                    StorageError::CreateDirectory {
                        path: parent.to_path_buf(),
                        source,
                    }
                }
            })?;
        }

        let conn = Connection::open(path)?;
        debug!("Opened store at {:?}", path);
        Self::from_connection(conn)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> StorageResult<Self> {
        if needs_init(&conn) {
            debug!("Upgrading store schema");
        }
        // Also rejects databases written by a newer version
        init_schema(&mut conn)?;
        Ok(Self { conn })
    }

    /// Begin a transaction over the given collections
    pub fn transaction(
        &mut self,
        scope: &[Collection],
        mode: TxMode,
    ) -> StorageResult<Transaction<'_>> {
        let behavior = match mode {
            TxMode::ReadOnly => TransactionBehavior::Deferred,
            TxMode::ReadWrite => TransactionBehavior::Immediate,
        };
        let tx = self.conn.transaction_with_behavior(behavior)?;
        Ok(Transaction {
            tx,
            scope: scope.to_vec(),
            mode,
        })
    }

    // ==================== Single-operation helpers ====================

    /// Get one record in its own read-only transaction
    pub fn get<R: Record>(&mut self, key: &R::Key) -> StorageResult<Option<R>> {
        let tx = self.transaction(&[R::COLLECTION], TxMode::ReadOnly)?;
        tx.get(key)
    }

    /// Get every record of a collection in its own read-only transaction
    pub fn get_all<R: Record>(&mut self) -> StorageResult<Vec<R>> {
        let tx = self.transaction(&[R::COLLECTION], TxMode::ReadOnly)?;
        tx.get_all()
    }

    /// Insert a new record, assigning its key if the collection generates keys
    pub fn add<R: Record>(&mut self, record: &mut R) -> StorageResult<R::Key> {
        let mut tx = self.transaction(&[R::COLLECTION], TxMode::ReadWrite)?;
        let key = tx.add(record)?;
        tx.commit()?;
        Ok(key)
    }

    /// Insert or overwrite a record
    pub fn put<R: Record>(&mut self, record: &mut R) -> StorageResult<R::Key> {
        let mut tx = self.transaction(&[R::COLLECTION], TxMode::ReadWrite)?;
        let key = tx.put(record)?;
        tx.commit()?;
        Ok(key)
    }

    /// Delete a record; returns whether it existed
    pub fn delete<R: Record>(&mut self, key: &R::Key) -> StorageResult<bool> {
        let mut tx = self.transaction(&[R::COLLECTION], TxMode::ReadWrite)?;
        let existed = tx.delete::<R>(key)?;
        tx.commit()?;
        Ok(existed)
    }

    /// Number of records in a collection
    pub fn count(&self, collection: Collection) -> StorageResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", collection.name());
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

/// A unit of work over a fixed set of collections
pub struct Transaction<'conn> {
    tx: rusqlite::Transaction<'conn>,
    scope: Vec<Collection>,
    mode: TxMode,
}

impl Transaction<'_> {
    pub fn mode(&self) -> TxMode {
        self.mode
    }

    fn check(&self, collection: Collection, write: bool) -> StorageResult<()> {
        if !self.scope.contains(&collection) {
            return Err(StorageError::OutOfScope { collection });
        }
        if write && self.mode == TxMode::ReadOnly {
            return Err(StorageError::ReadOnly { collection });
        }
        Ok(())
    }

    /// Get a record by key
    pub fn get<R: Record>(&self, key: &R::Key) -> StorageResult<Option<R>> {
        self.check(R::COLLECTION, false)?;

        let sql = format!(
            "SELECT record FROM {} WHERE key = ?1",
            R::COLLECTION.name()
        );
        let bytes: Option<Vec<u8>> = self
            .tx
            .query_row(&sql, params![key], |row| row.get(0))
            .optional()?;

        bytes
            .map(|bytes| {
                let mut record: R = decode(key, &bytes)?;
                if R::COLLECTION.auto_key() {
                    record.set_key(key.clone());
                }
                Ok(record)
            })
            .transpose()
    }

    /// Get all records in insertion order
    pub fn get_all<R: Record>(&self) -> StorageResult<Vec<R>> {
        self.check(R::COLLECTION, false)?;

        let sql = format!(
            "SELECT key, record FROM {} ORDER BY rowid",
            R::COLLECTION.name()
        );
        let mut stmt = self.tx.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, R::Key>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (key, bytes) = row?;
            let mut record: R = decode(&key, &bytes)?;
            if R::COLLECTION.auto_key() {
                record.set_key(key);
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Insert a new record
    ///
    /// Fails with `KeyExists` if a record with the same key is present.
    pub fn add<R: Record>(&mut self, record: &mut R) -> StorageResult<R::Key> {
        self.check(R::COLLECTION, true)?;
        let table = R::COLLECTION.name();

        match record.key() {
            Some(key) => {
                let exists_sql = format!("SELECT 1 FROM {} WHERE key = ?1", table);
                if self.tx.prepare(&exists_sql)?.exists(params![key])? {
                    return Err(StorageError::KeyExists {
                        collection: R::COLLECTION,
                        key: key.to_string(),
                    });
                }

                let bytes = encode(record)?;
                let sql = format!("INSERT INTO {} (key, record) VALUES (?1, ?2)", table);
                self.tx.execute(&sql, params![key, bytes])?;
                Ok(key)
            }
            None => self.insert_generated(record),
        }
    }

    /// Insert or overwrite a record (last write wins)
    pub fn put<R: Record>(&mut self, record: &mut R) -> StorageResult<R::Key> {
        self.check(R::COLLECTION, true)?;

        match record.key() {
            Some(key) => {
                let bytes = encode(record)?;
                let sql = format!(
                    "INSERT OR REPLACE INTO {} (key, record) VALUES (?1, ?2)",
                    R::COLLECTION.name()
                );
                self.tx.execute(&sql, params![key, bytes])?;
                Ok(key)
            }
            None => self.insert_generated(record),
        }
    }

    fn insert_generated<R: Record>(&mut self, record: &mut R) -> StorageResult<R::Key> {
        if !R::COLLECTION.auto_key() {
            return Err(StorageError::MissingKey {
                collection: R::COLLECTION,
            });
        }

        let table = R::COLLECTION.name();
        let bytes = encode(record)?;
        self.tx
            .execute(&format!("INSERT INTO {} (record) VALUES (?1)", table), params![bytes])?;

        let rowid = self.tx.last_insert_rowid();
        let key: R::Key = self.tx.query_row(
            &format!("SELECT key FROM {} WHERE rowid = ?1", table),
            params![rowid],
            |row| row.get(0),
        )?;
        record.set_key(key.clone());
        Ok(key)
    }

    /// Delete a record by key; returns whether it existed
    pub fn delete<R: Record>(&mut self, key: &R::Key) -> StorageResult<bool> {
        self.check(R::COLLECTION, true)?;

        let sql = format!("DELETE FROM {} WHERE key = ?1", R::COLLECTION.name());
        let affected = self.tx.execute(&sql, params![key])?;
        Ok(affected > 0)
    }

    /// Make this transaction's writes visible to later transactions
    pub fn commit(self) -> StorageResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}
