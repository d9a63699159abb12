//! Fulfillment Server - order fulfillment and billing reconciliation
//!
//! Multi-vendor restaurant ordering backend: orders flow in across
//! dining, delivery and pickup channels, advance through channel-scoped
//! status flows, get their kitchen tickets printed (possibly partially,
//! possibly twice) and end in a reconciled, tax-correct bill.
//!
//! # Module structure
//!
//! ```text
//! fulfillment-server/src/
//! ├── core/          # Config, state, server bootstrap
//! ├── pricing/       # Reconciliation engine + invoice builder
//! ├── lifecycle/     # Channel-aware status state machine
//! ├── printing/      # Kitchen ticket print tracking
//! ├── events/        # Lifecycle event fan-out + resync
//! ├── orders/        # OrdersManager + redb storage
//! ├── catalog/       # Collaborator traits (tax defaults, vendors, tables)
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Error envelope, logging
//! ```

pub mod api;
pub mod catalog;
pub mod core;
pub mod events;
pub mod lifecycle;
pub mod orders;
pub mod pricing;
pub mod printing;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, Server, ServerState};
pub use events::EventBroadcaster;
pub use orders::{OrderError, OrderStorage, OrdersManager};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Prepare the process environment: dotenv, working directory, logging
pub fn setup_environment() -> anyhow::Result<Config> {
    dotenv::dotenv().ok();
    let config = Config::from_env();

    std::fs::create_dir_all(&config.work_dir)?;
    let log_dir = std::path::Path::new(&config.work_dir).join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let level = if config.is_development() { "debug" } else { "info" };
    if config.is_production() {
        init_logger_with_file(Some(level), log_dir.to_str());
    } else {
        init_logger_with_file(Some(level), None);
    }

    Ok(config)
}
