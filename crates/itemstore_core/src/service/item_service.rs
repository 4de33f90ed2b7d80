//! Item facade with per-call database fallback.
//!
//! # Responsibility
//! - Serve list/get/create/delete from the database when it is preferred and reachable.
//! - Serve the same calls from the in-memory store otherwise.
//! - Report service health and the preferred storage mode.
//!
//! # Invariants
//! - Database failures never reach callers; they only select the in-memory path.
//! - `NotFound` is reported identically by both paths.
//! - Each database call uses its own connection, released before the call returns.
//! - Under `FallbackPolicy::PerCall` a failure never changes the preferred mode.

use crate::config::{DatabaseConfig, FallbackPolicy, ServiceConfig};
use crate::db::{initialize, probe_existing};
use crate::model::item::{Item, ItemId, ItemValidationError, NewItem};
use crate::repo::item_repo::{RepoResult, SqliteItemRepository};
use crate::storage::{StorageMode, StorageModeRegister};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

pub type ItemResult<T> = Result<T, ItemError>;

/// Caller-visible item errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    NotFound(ItemId),
    Validation(ItemValidationError),
    /// The in-memory store has no ids left to assign.
    IdSpaceExhausted,
}

impl Display for ItemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::IdSpaceExhausted => write!(f, "in-memory item ids are exhausted"),
        }
    }
}

impl Error for ItemError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) | Self::IdSpaceExhausted => None,
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<ItemValidationError> for ItemError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Connected,
    Disconnected,
}

/// Health snapshot served by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: DatabaseStatus,
    pub environment: String,
    pub storage_mode: StorageMode,
    pub timestamp: DateTime<Utc>,
}

/// Storage-agnostic entry point for item operations.
pub struct ItemFacade {
    database: DatabaseConfig,
    policy: FallbackPolicy,
    environment: String,
    register: Arc<StorageModeRegister>,
}

impl ItemFacade {
    /// Wraps an already initialized register.
    pub fn new(config: &ServiceConfig, register: Arc<StorageModeRegister>) -> Self {
        Self {
            database: config.database.clone(),
            policy: config.fallback_policy,
            environment: config.environment.clone(),
            register,
        }
    }

    /// Creates the register, runs schema initialization, and wraps the result.
    ///
    /// # Side effects
    /// - May block for the startup probe budget.
    pub fn bootstrap(config: &ServiceConfig) -> Self {
        let register = Arc::new(StorageModeRegister::new(config.memory_id_seed));
        initialize(&config.database, &register);
        Self::new(config, register)
    }

    /// Preferred storage mode as currently recorded.
    pub fn mode(&self) -> StorageMode {
        self.register.mode()
    }

    pub fn register(&self) -> &Arc<StorageModeRegister> {
        &self.register
    }

    /// Lists items in ascending id order. Never fails.
    pub fn list(&self) -> Vec<Item> {
        match self.with_database("list", |repo| repo.list_items()) {
            Some(items) => items,
            None => self.register.list_items(),
        }
    }

    /// Gets one item from whichever path serves the call.
    pub fn get(&self, id: ItemId) -> ItemResult<Item> {
        let found = match self.with_database("get", |repo| repo.get_item(id)) {
            Some(found) => found,
            None => self.register.get_item(id),
        };

        found.ok_or(ItemError::NotFound(id))
    }

    /// Validates input and creates an item with storage-assigned id and timestamp.
    pub fn create(
        &self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> ItemResult<Item> {
        let new_item = NewItem::new(name, description)?;

        match self.with_database("create", |repo| repo.create_item(&new_item)) {
            Some(item) => Ok(item),
            None => self
                .register
                .insert_item(new_item)
                .ok_or(ItemError::IdSpaceExhausted),
        }
    }

    /// Deletes an item and returns its id.
    pub fn delete(&self, id: ItemId) -> ItemResult<ItemId> {
        let existed = match self.with_database("delete", |repo| repo.delete_item(id)) {
            Some(existed) => existed,
            None => self.register.remove_item(id).is_some(),
        };

        if existed {
            Ok(id)
        } else {
            Err(ItemError::NotFound(id))
        }
    }

    /// Probes the database once and reports it along with the preferred mode.
    pub fn health(&self) -> HealthReport {
        let database = match probe_existing(&self.database, 1, Duration::ZERO) {
            Some(_conn) => DatabaseStatus::Connected,
            None => DatabaseStatus::Disconnected,
        };

        HealthReport {
            status: "healthy",
            database,
            environment: self.environment.clone(),
            storage_mode: self.register.mode(),
            timestamp: Utc::now(),
        }
    }

    /// Runs `op` against a freshly probed connection when the database is preferred.
    ///
    /// Returns `None` when the call must be served from memory.
    fn with_database<T>(
        &self,
        operation: &'static str,
        op: impl FnOnce(&SqliteItemRepository<'_>) -> RepoResult<T>,
    ) -> Option<T> {
        if self.register.mode() != StorageMode::Database {
            debug!("event=item_op module=service op={operation} path=memory");
            return None;
        }

        let Some(conn) = probe_existing(&self.database, 1, Duration::ZERO) else {
            self.fall_back(operation, &"database unreachable");
            return None;
        };

        let result = op(&SqliteItemRepository::new(&conn));
        match result {
            Ok(value) => {
                debug!("event=item_op module=service op={operation} path=database");
                Some(value)
            }
            Err(err) => {
                self.fall_back(operation, &err);
                None
            }
        }
    }

    fn fall_back(&self, operation: &'static str, cause: &dyn Display) {
        warn!(
            "event=item_fallback module=service status=fallback op={operation} policy={} error={cause}",
            self.policy.as_str()
        );

        if self.policy == FallbackPolicy::Latch && self.register.latch_in_memory() {
            warn!(
                "event=storage_mode module=service status=latched mode={}",
                StorageMode::InMemory.as_str()
            );
        }
    }
}
