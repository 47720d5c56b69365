//! redb-based storage for settings and transaction snapshots
//!
//! The print pipeline only reads: it consumes settings rows and
//! transaction snapshots through the [`SettingsLookup`] and
//! [`TransactionSource`] traits. The write side here exists for the
//! checkout flow that records transactions and for seeding.

use crate::printing::types::{SettingsLookup, TransactionSnapshot, TransactionSource};
use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Settings table: key = setting name, value = raw string
const SETTINGS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("settings");

/// Transactions table: key = transaction id, value = JSON snapshot
const TRANSACTIONS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("transactions");

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Embedded key-value store for the POS data the print pipeline reads
#[derive(Clone)]
pub struct PosStorage {
    db: Arc<Database>,
}

impl PosStorage {
    /// Open or create the database file
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, demos)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Make sure the tables exist before the first read
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SETTINGS_TABLE)?;
            let _ = write_txn.open_table(TRANSACTIONS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Upsert one settings row
    pub fn put_setting(&self, key: &str, value: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SETTINGS_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// All settings rows as a map
    pub fn load_settings(&self) -> StorageResult<HashMap<String, String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS_TABLE)?;

        let mut map = HashMap::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            map.insert(key.value().to_string(), value.value().to_string());
        }
        Ok(map)
    }

    /// Store a transaction snapshot
    pub fn put_transaction(&self, tx: &TransactionSnapshot) -> StorageResult<()> {
        let json = serde_json::to_vec(tx)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TRANSACTIONS_TABLE)?;
            table.insert(tx.id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load a transaction snapshot by id
    pub fn load_transaction(&self, id: u64) -> StorageResult<Option<TransactionSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRANSACTIONS_TABLE)?;

        match table.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }
}

impl TransactionSource for PosStorage {
    fn transaction(&self, id: u64) -> anyhow::Result<Option<TransactionSnapshot>> {
        Ok(self.load_transaction(id)?)
    }
}

impl SettingsLookup for PosStorage {
    fn settings_map(&self) -> anyhow::Result<HashMap<String, String>> {
        Ok(self.load_settings()?)
    }
}
