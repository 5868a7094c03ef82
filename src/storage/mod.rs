//! Stocktake storage layer
//!
//! This module provides the data access seam and its backends:
//!
//! - **types**: Records (Product, InventoryRecord, SalesRecord, ...)
//! - **backend**: The `InventoryStore` trait every backend implements
//! - **sqlite**: Local single-file database
//! - **remote**: Hosted Postgres through its PostgREST interface
//! - **memory**: In-process tables, optionally seeded with sample data
//! - **fallback**: Switches to sample data when the backend fails
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Service → FallbackStore ─┬→ SqliteStore | RemoteStore   (healthy)
//!                          └→ MemoryStore (sample data)   (after first failure)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use stocktake::storage::{InventoryStore, MemoryStore, Product};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     let product = store.insert_product(Product::new("SP001", "Green tea", "box")).await?;
//!     println!("Created product {}", product.id);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod fallback;
pub mod memory;
pub mod remote;
pub mod sample;
pub mod sqlite;
pub mod types;

pub use backend::InventoryStore;
pub use error::{StorageError, StorageResult};
pub use fallback::FallbackStore;
pub use memory::MemoryStore;
pub use remote::{RemoteConfig, RemoteStore};
pub use sqlite::SqliteStore;
pub use types::{
    normalize_code, ApprovalAction, ApprovalLog, ApprovalStatus, DateRange, ExportLog,
    InventoryRecord, Movement, Product, RecordFilter, SalesRecord, SpecialOutboundRecord,
    VarianceReport,
};

use std::path::Path;
use std::sync::Arc;

use crate::config::{Backend, StorageConfig};

/// Open the configured backend, wrapped in a [`FallbackStore`] when enabled
pub fn open_store(config: &StorageConfig) -> StorageResult<Arc<dyn InventoryStore>> {
    let primary: Arc<dyn InventoryStore> = match config.backend {
        Backend::Memory => {
            tracing::info!("Using in-memory store with sample data");
            return Ok(Arc::new(MemoryStore::with_sample_data()));
        }
        Backend::Sqlite => {
            tracing::info!(path = %config.database_path, "Opening SQLite store");
            match SqliteStore::open(Path::new(&config.database_path)) {
                Ok(store) => Arc::new(store),
                Err(e) if config.fallback_to_sample_data => {
                    return Ok(Arc::new(FallbackStore::degraded("sqlite", &e)));
                }
                Err(e) => return Err(e),
            }
        }
        Backend::Remote => {
            tracing::info!(url = %config.remote_url, "Using remote store");
            Arc::new(RemoteStore::new(RemoteConfig {
                base_url: config.remote_url.clone(),
                api_key: config.remote_api_key.clone(),
                request_timeout_ms: config.remote_timeout_ms,
            })?)
        }
    };

    if config.fallback_to_sample_data {
        Ok(Arc::new(FallbackStore::new(primary)))
    } else {
        Ok(primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sqlite_config(path: String) -> StorageConfig {
        StorageConfig {
            backend: Backend::Sqlite,
            database_path: path,
            ..StorageConfig::default()
        }
    }

    #[tokio::test]
    async fn test_open_sqlite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stocktake.db");
        let store = open_store(&sqlite_config(path.display().to_string())).unwrap();

        assert!(store.list_products().await.unwrap().is_empty());
        assert!(!store.is_degraded());
        assert_eq!(store.name(), "sqlite");
    }

    #[tokio::test]
    async fn test_unopenable_sqlite_falls_back_degraded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("nested").join("stocktake.db");
        // a regular file where the parent directory should be
        std::fs::write(dir.path().join("missing"), b"").unwrap();

        let store = open_store(&sqlite_config(path.display().to_string())).unwrap();

        assert!(store.is_degraded());
        assert!(!store.list_products().await.unwrap().is_empty());
    }

    #[test]
    fn test_unopenable_sqlite_without_fallback_errors() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("missing"), b"").unwrap();
        let path = dir.path().join("missing").join("stocktake.db");

        let mut config = sqlite_config(path.display().to_string());
        config.fallback_to_sample_data = false;
        assert!(open_store(&config).is_err());
    }
}
