//! Storage mode register and in-memory item store.
//!
//! # Invariants
//! - `items` and `next_id` are only touched under one mutex, so concurrent
//!   creates always receive distinct ids.
//! - `next_id` only grows; deleted ids are never handed out again.
//! - Once `next_id` would pass `ItemId::MAX`, inserts are refused instead of wrapping.
//! - `items` stays in insertion order, which is ascending id order.

use crate::model::item::{Item, ItemId, NewItem};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Preferred storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageMode {
    Database,
    InMemory,
}

impl StorageMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::InMemory => "in-memory",
        }
    }
}

#[derive(Debug)]
struct MemoryState {
    items: Vec<Item>,
    next_id: ItemId,
}

/// Shared storage state injected into the item facade.
///
/// Starts in `InMemory` mode until the schema initializer resolves the
/// database.
#[derive(Debug)]
pub struct StorageModeRegister {
    prefers_database: AtomicBool,
    memory: Mutex<MemoryState>,
}

impl StorageModeRegister {
    /// Creates a register whose first in-memory id is `id_seed`.
    pub fn new(id_seed: ItemId) -> Self {
        Self {
            prefers_database: AtomicBool::new(false),
            memory: Mutex::new(MemoryState {
                items: Vec::new(),
                next_id: id_seed,
            }),
        }
    }

    pub fn mode(&self) -> StorageMode {
        if self.prefers_database.load(Ordering::Acquire) {
            StorageMode::Database
        } else {
            StorageMode::InMemory
        }
    }

    pub fn set_mode(&self, mode: StorageMode) {
        self.prefers_database
            .store(mode == StorageMode::Database, Ordering::Release);
    }

    /// Flips `Database` to `InMemory`; returns whether this call made the change.
    pub fn latch_in_memory(&self) -> bool {
        self.prefers_database
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Snapshot of the in-memory collection in ascending id order.
    pub fn list_items(&self) -> Vec<Item> {
        self.lock().items.clone()
    }

    pub fn get_item(&self, id: ItemId) -> Option<Item> {
        self.lock().items.iter().find(|item| item.id == id).cloned()
    }

    /// Assigns the next id and current time, then appends the item.
    ///
    /// Returns `None` without touching the collection when the id space is exhausted.
    pub fn insert_item(&self, new_item: NewItem) -> Option<Item> {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id = id.checked_add(1)?;

        let item = new_item.into_item(id, Utc::now());
        state.items.push(item.clone());
        Some(item)
    }

    /// Removes the item with `id`, returning it when present.
    pub fn remove_item(&self, id: ItemId) -> Option<Item> {
        let mut state = self.lock();
        let index = state.items.iter().position(|item| item.id == id)?;
        Some(state.items.remove(index))
    }

    /// Id the next in-memory create will receive.
    pub fn next_id(&self) -> ItemId {
        self.lock().next_id
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // Every mutation leaves the state consistent, so a poisoned guard is still usable.
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
