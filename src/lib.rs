// Lease Ledger - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod error;
pub mod lease;
pub mod calculator;
pub mod backend;
pub mod store;
pub mod summary;
pub mod csv_io;
pub mod config;

// Re-export commonly used types
pub use error::{LeaseError, LeaseResult, ValidationError};
pub use lease::{Lease, LeaseDraft, LeasePatch, LeaseType, STATUS_ACTIVE};
pub use calculator::{lease_cost, escalated_cost, projected_cost, monthly_outlay, round_money, sum_money};
pub use backend::{LeaseBackend, MemoryBackend, SqliteBackend, DEFAULT_COLLECTION_KEY};
pub use store::LeaseStore;
pub use summary::{PortfolioSummary, format_currency};
pub use csv_io::{export_csv, import_csv};
pub use config::{Config, ConfigError};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Open the SQLite-backed store named by the config, creating its directory
pub fn open_store(config: &config::StorageConfig) -> LeaseResult<LeaseStore<SqliteBackend>> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let backend = SqliteBackend::open(&config.db_path, &config.collection_key)?;
    tracing::debug!(path = ?config.db_path, key = %config.collection_key, "opened local store");
    LeaseStore::open(backend)
}

/// Install the stderr subscriber; `RUST_LOG` wins over the configured level
pub fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
