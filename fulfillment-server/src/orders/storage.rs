//! redb-based order storage
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` (JSON) | Order records |
//! | `active_orders` | `order_id` | `()` | Non-terminal order index |
//! | `tickets` | `order_id` | `KitchenTicket` (JSON) | One ticket per order |
//! | `counters` | name | `u64` | Crash-safe ticket numbering |
//!
//! redb commits with `Durability::Immediate` by default: a committed
//! write survives power loss and the file is always in a consistent
//! state. Callers compose read-modify-write cycles inside a single
//! `WriteTransaction` so concurrent mutations of the same order
//! serialize instead of clobbering each other.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::order::{KitchenTicket, Order};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Existence index of orders that have not reached a terminal status
const ACTIVE_ORDERS_TABLE: TableDefinition<&str, ()> = TableDefinition::new("active_orders");

const TICKETS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tickets");

const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const TICKET_COUNT_KEY: &str = "ticket_count";

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

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_ORDERS_TABLE)?;
            let _ = write_txn.open_table(TICKETS_TABLE)?;
            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(TICKET_COUNT_KEY)?.is_none() {
                counters.insert(TICKET_COUNT_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Order Operations ==========

    /// Read an order within a write transaction
    pub fn get_order_txn(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<Order> {
        let table = txn.open_table(ORDERS_TABLE)?;
        // Bind before returning so the access guard drops ahead of the table
        let Some(value) = table.get(order_id)? else {
            return Err(StorageError::OrderNotFound(order_id.to_string()));
        };
        let order = serde_json::from_slice(value.value())?;
        Ok(order)
    }

    /// Store an order within a write transaction
    pub fn put_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Read an order (read-only)
    pub fn get_order(&self, order_id: &str) -> StorageResult<Order> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::OrderNotFound(order_id.to_string())),
        }
    }

    // ========== Active Order Index ==========

    pub fn mark_order_active(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_ORDERS_TABLE)?;
        table.insert(order_id, ())?;
        Ok(())
    }

    pub fn mark_order_inactive(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    /// All orders that have not reached a terminal status
    pub fn get_active_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let active_table = read_txn.open_table(ACTIVE_ORDERS_TABLE)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in active_table.iter()? {
            let (key, _) = result?;
            if let Some(value) = orders_table.get(key.value())? {
                orders.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(orders)
    }

    // ========== Kitchen Tickets ==========

    pub fn get_ticket_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<KitchenTicket>> {
        let table = txn.open_table(TICKETS_TABLE)?;
        let ticket = match table.get(order_id)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(ticket)
    }

    pub fn put_ticket_txn(
        &self,
        txn: &WriteTransaction,
        ticket: &KitchenTicket,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(TICKETS_TABLE)?;
        let value = serde_json::to_vec(ticket)?;
        table.insert(ticket.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn get_ticket(&self, order_id: &str) -> StorageResult<Option<KitchenTicket>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TICKETS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Ticket Counter ==========

    /// Increment and return the ticket counter within a transaction.
    ///
    /// The increment commits together with the ticket that consumed it,
    /// so a crash can never hand out the same number twice.
    pub fn next_ticket_count(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table
            .get(TICKET_COUNT_KEY)?
            .map(|g| g.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(TICKET_COUNT_KEY, next)?;
        Ok(next)
    }

    // ========== Cleanup ==========

    /// Delete orders that are no longer in the active index, along with
    /// their tickets. Returns the number of orders removed.
    pub fn purge_terminal(&self) -> StorageResult<usize> {
        let txn = self.begin_write()?;
        let removed = {
            let active_table = txn.open_table(ACTIVE_ORDERS_TABLE)?;
            let mut orders_table = txn.open_table(ORDERS_TABLE)?;
            let mut tickets_table = txn.open_table(TICKETS_TABLE)?;

            let mut terminal_ids: Vec<String> = Vec::new();
            for result in orders_table.iter()? {
                let (key, _) = result?;
                if active_table.get(key.value())?.is_none() {
                    terminal_ids.push(key.value().to_string());
                }
            }

            for order_id in &terminal_ids {
                orders_table.remove(order_id.as_str())?;
                tickets_table.remove(order_id.as_str())?;
            }
            terminal_ids.len()
        };
        txn.commit()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{Channel, ChannelRef, CustomerInfo, OrderStatus, StatusTimestamps};

    fn test_order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            vendor_id: "v1".to_string(),
            channel: Channel::Pickup,
            status: OrderStatus::Pending,
            items_payload: "[]".to_string(),
            payment_method: None,
            customer: CustomerInfo::default(),
            channel_ref: ChannelRef::Pickup {
                reference: "P-1".to_string(),
            },
            timestamps: StatusTimestamps::default(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_order_roundtrip() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = test_order("o1");

        let txn = storage.begin_write().unwrap();
        storage.put_order_txn(&txn, &order).unwrap();
        txn.commit().unwrap();

        let loaded = storage.get_order("o1").unwrap();
        assert_eq!(loaded.id, "o1");
        assert_eq!(loaded.channel, Channel::Pickup);
    }

    #[test]
    fn test_read_modify_write_in_one_transaction() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = test_order("o1");

        let txn = storage.begin_write().unwrap();
        storage.put_order_txn(&txn, &order).unwrap();
        txn.commit().unwrap();

        // Read back through the write-transaction path, mutate, store
        let txn = storage.begin_write().unwrap();
        let mut loaded = storage.get_order_txn(&txn, "o1").unwrap();
        assert!(storage.get_ticket_txn(&txn, "o1").unwrap().is_none());
        loaded.status = OrderStatus::Accepted;
        storage.put_order_txn(&txn, &loaded).unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.get_order("o1").unwrap().status, OrderStatus::Accepted);

        let txn = storage.begin_write().unwrap();
        assert!(matches!(
            storage.get_order_txn(&txn, "ghost"),
            Err(StorageError::OrderNotFound(_))
        ));
        txn.abort().unwrap();
    }

    #[test]
    fn test_missing_order_is_not_found() {
        let storage = OrderStorage::open_in_memory().unwrap();
        assert!(matches!(
            storage.get_order("ghost"),
            Err(StorageError::OrderNotFound(_))
        ));
    }

    #[test]
    fn test_active_index() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = test_order("o1");

        let txn = storage.begin_write().unwrap();
        storage.put_order_txn(&txn, &order).unwrap();
        storage.mark_order_active(&txn, "o1").unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.get_active_orders().unwrap().len(), 1);

        let txn = storage.begin_write().unwrap();
        storage.mark_order_inactive(&txn, "o1").unwrap();
        txn.commit().unwrap();

        assert!(storage.get_active_orders().unwrap().is_empty());
    }

    #[test]
    fn test_ticket_counter_monotonic() {
        let storage = OrderStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        let first = storage.next_ticket_count(&txn).unwrap();
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        let second = storage.next_ticket_count(&txn).unwrap();
        txn.commit().unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn test_uncommitted_counter_increment_rolls_back() {
        let storage = OrderStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        let first = storage.next_ticket_count(&txn).unwrap();
        assert_eq!(first, 1);
        txn.abort().unwrap();

        let txn = storage.begin_write().unwrap();
        let retry = storage.next_ticket_count(&txn).unwrap();
        txn.commit().unwrap();
        assert_eq!(retry, 1);
    }

    #[test]
    fn test_purge_terminal_keeps_active() {
        let storage = OrderStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.put_order_txn(&txn, &test_order("active")).unwrap();
        storage.mark_order_active(&txn, "active").unwrap();
        storage.put_order_txn(&txn, &test_order("done")).unwrap();
        txn.commit().unwrap();

        let removed = storage.purge_terminal().unwrap();
        assert_eq!(removed, 1);
        assert!(storage.get_order("active").is_ok());
        assert!(storage.get_order("done").is_err());
    }
}
