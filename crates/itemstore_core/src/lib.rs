//! Core storage logic for the items service.
//! Owns availability probing, mode selection, and the storage-agnostic item facade.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{ConfigError, DatabaseConfig, FallbackPolicy, ServiceConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::item::{Item, ItemId, ItemValidationError, NewItem};
pub use repo::item_repo::{RepoError, RepoResult, SqliteItemRepository};
pub use service::item_service::{DatabaseStatus, HealthReport, ItemError, ItemFacade, ItemResult};
pub use storage::{StorageMode, StorageModeRegister};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
