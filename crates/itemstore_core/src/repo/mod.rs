//! Repository layer for SQLite persistence.
//!
//! # Responsibility
//! - Isolate SQL details from the item facade.
//!
//! # Invariants
//! - Repository writes only accept validated `NewItem` input.
//! - Absence is reported as `None`/`false`; errors are reserved for transport
//!   and data corruption.

pub mod item_repo;
