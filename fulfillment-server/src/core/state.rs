//! Shared server state
//!
//! One `ServerState` is built at startup and cloned into every handler
//! and background task. Everything mutable lives behind the manager or
//! the in-memory collaborator stores.

use crate::catalog::{InMemoryCatalog, InMemoryTableStore, InMemoryVendorProfiles};
use crate::core::Config;
use crate::events::EventBroadcaster;
use crate::orders::{OrderStorage, OrdersManager};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub manager: Arc<OrdersManager>,
    pub catalog: Arc<InMemoryCatalog>,
    pub vendors: Arc<InMemoryVendorProfiles>,
    pub tables: Arc<InMemoryTableStore>,
    /// Fires once on shutdown; background tasks select on it
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// Open storage under the working directory and wire up the manager
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let db_path = std::path::Path::new(&config.work_dir).join("orders.redb");
        let storage = OrderStorage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Order storage opened");

        Ok(Self::with_storage(config.clone(), storage))
    }

    /// Build state over an already-open storage (tests use the in-memory
    /// backend here)
    pub fn with_storage(config: Config, storage: OrderStorage) -> Self {
        let broadcaster = EventBroadcaster::new(config.event_channel_capacity);
        let catalog = Arc::new(InMemoryCatalog::new());
        let vendors = Arc::new(InMemoryVendorProfiles::new());
        let tables = Arc::new(InMemoryTableStore::new());

        let manager = Arc::new(OrdersManager::new(
            storage,
            broadcaster,
            catalog.clone(),
            vendors.clone(),
            tables.clone(),
        ));

        Self {
            config,
            manager,
            catalog,
            vendors,
            tables,
            shutdown: CancellationToken::new(),
        }
    }
}
