//! redb-based storage for the floor plan
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `dining_tables` | `table_id` | `DiningTable` | Tables, positions, grouping |
//! | `open_orders` | `root_table_id` | `OpenOrder` | One open order per group root |
//! | `processed_joins` | `operation_id` | `JoinReceipt` | Join idempotency |
//! | `processed_join_log` | `sequence` | `operation_id` | Receipt age, oldest first |
//! | `sequence_counter` | `&str` | `u64` | Id sequences |
//!
//! Values are JSON. Every grouping mutation (join, disjoin, transfer) runs in
//! a single write transaction, so relationship, positions, orders and
//! occupancy commit together or not at all.

use std::path::Path;
use std::sync::Arc;

use floor_engine::FloorPlan;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::models::{DiningTable, JoinReceipt, OpenOrder, TableId};
use thiserror::Error;

/// key = table id, value = JSON-serialized DiningTable
const TABLES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("dining_tables");

/// key = group root table id, value = JSON-serialized OpenOrder
const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("open_orders");

/// key = operation id, value = JSON-serialized JoinReceipt
const PROCESSED_JOINS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("processed_joins");

/// key = record sequence, value = operation id
const PROCESSED_JOIN_LOG_TABLE: TableDefinition<u64, &str> =
    TableDefinition::new("processed_join_log");

/// key = sequence name, value = last issued id
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

pub const TABLE_ID_KEY: &str = "table_id";
pub const ITEM_ID_KEY: &str = "item_id";
const JOIN_LOG_KEY: &str = "join_log";

/// Join receipts kept for replay detection; older ones are dropped
pub const MAX_PROCESSED_JOINS: u64 = 10_000;

/// Storage errors
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

/// Floor-plan storage backed by redb
#[derive(Clone)]
pub struct FloorStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for FloorStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloorStorage").finish_non_exhaustive()
    }
}

impl FloorStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(TABLES_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_JOINS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_JOIN_LOG_TABLE)?;
            let _ = write_txn.open_table(SEQUENCE_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Increment and return the named sequence
    pub fn next_id(&self, txn: &WriteTransaction, key: &str) -> StorageResult<i64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table.get(key)?.map(|guard| guard.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key, next)?;
        Ok(next as i64)
    }

    // ========== Dining Tables ==========

    /// All tables (read-only), ordered by id
    pub fn list_tables(&self) -> StorageResult<Vec<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLES_TABLE)?;
        collect_values(&table)
    }

    pub fn get_table(&self, id: TableId) -> StorageResult<Option<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLES_TABLE)?;
        get_value(&table, id)
    }

    pub fn count_tables(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLES_TABLE)?;
        Ok(table.len()?)
    }

    /// Whole floor as seen by this transaction
    pub fn load_floor(&self, txn: &WriteTransaction) -> StorageResult<FloorPlan> {
        let table = txn.open_table(TABLES_TABLE)?;
        Ok(FloorPlan::new(collect_values::<_, DiningTable>(&table)?))
    }

    pub fn get_table_txn(
        &self,
        txn: &WriteTransaction,
        id: TableId,
    ) -> StorageResult<Option<DiningTable>> {
        let table = txn.open_table(TABLES_TABLE)?;
        get_value(&table, id)
    }

    pub fn put_table(&self, txn: &WriteTransaction, dining_table: &DiningTable) -> StorageResult<()> {
        let mut table = txn.open_table(TABLES_TABLE)?;
        let value = serde_json::to_vec(dining_table)?;
        table.insert(dining_table.id, value.as_slice())?;
        Ok(())
    }

    /// Write back every table of the plan
    pub fn put_floor(&self, txn: &WriteTransaction, floor: &FloorPlan) -> StorageResult<()> {
        let mut table = txn.open_table(TABLES_TABLE)?;
        for dining_table in floor.tables() {
            let value = serde_json::to_vec(dining_table)?;
            table.insert(dining_table.id, value.as_slice())?;
        }
        Ok(())
    }

    pub fn delete_table(&self, txn: &WriteTransaction, id: TableId) -> StorageResult<bool> {
        let mut table = txn.open_table(TABLES_TABLE)?;
        Ok(table.remove(id)?.is_some())
    }

    // ========== Open Orders ==========

    /// Open order owned by the group root (read-only)
    pub fn get_order(&self, root_id: TableId) -> StorageResult<Option<OpenOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        get_value(&table, root_id)
    }

    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        root_id: TableId,
    ) -> StorageResult<Option<OpenOrder>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        get_value(&table, root_id)
    }

    pub fn put_order(&self, txn: &WriteTransaction, order: &OpenOrder) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.table_id, value.as_slice())?;
        Ok(())
    }

    pub fn remove_order(
        &self,
        txn: &WriteTransaction,
        root_id: TableId,
    ) -> StorageResult<Option<OpenOrder>> {
        let existing = self.get_order_txn(txn, root_id)?;
        if existing.is_some() {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            table.remove(root_id)?;
        }
        Ok(existing)
    }

    pub fn has_order_txn(&self, txn: &WriteTransaction, root_id: TableId) -> StorageResult<bool> {
        let table = txn.open_table(ORDERS_TABLE)?;
        Ok(table.get(root_id)?.is_some())
    }

    pub fn count_orders(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        Ok(table.len()?)
    }

    // ========== Join Idempotency ==========

    /// Receipt of an already applied join (within transaction)
    pub fn processed_join(
        &self,
        txn: &WriteTransaction,
        operation_id: &str,
    ) -> StorageResult<Option<JoinReceipt>> {
        let table = txn.open_table(PROCESSED_JOINS_TABLE)?;
        match table.get(operation_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Record an applied join, keeping at most [`MAX_PROCESSED_JOINS`]
    pub fn mark_join_processed(
        &self,
        txn: &WriteTransaction,
        receipt: &JoinReceipt,
    ) -> StorageResult<()> {
        self.record_join(txn, receipt, MAX_PROCESSED_JOINS)
    }

    fn record_join(
        &self,
        txn: &WriteTransaction,
        receipt: &JoinReceipt,
        limit: u64,
    ) -> StorageResult<()> {
        let seq = self.next_id(txn, JOIN_LOG_KEY)? as u64;
        let mut receipts = txn.open_table(PROCESSED_JOINS_TABLE)?;
        let mut log = txn.open_table(PROCESSED_JOIN_LOG_TABLE)?;

        let value = serde_json::to_vec(receipt)?;
        receipts.insert(receipt.operation_id.as_str(), value.as_slice())?;
        log.insert(seq, receipt.operation_id.as_str())?;

        let mut pruned = 0usize;
        while log.len()? > limit {
            let Some((_seq, operation_id)) = log.pop_first()? else {
                break;
            };
            receipts.remove(operation_id.value())?;
            pruned += 1;
        }
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned old join receipts");
        }
        Ok(())
    }
}

fn collect_values<T, V>(table: &T) -> StorageResult<Vec<V>>
where
    T: ReadableTable<i64, &'static [u8]>,
    V: serde::de::DeserializeOwned,
{
    let mut values = Vec::new();
    for result in table.iter()? {
        let (_key, value) = result?;
        values.push(serde_json::from_slice(value.value())?);
    }
    Ok(values)
}

fn get_value<T, V>(table: &T, id: i64) -> StorageResult<Option<V>>
where
    T: ReadableTable<i64, &'static [u8]>,
    V: serde::de::DeserializeOwned,
{
    match table.get(id)? {
        Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
        None => Ok(None),
    }
}
