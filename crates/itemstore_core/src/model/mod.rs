//! Domain model for the items resource.
//!
//! # Responsibility
//! - Define the canonical `Item` record shared by database and in-memory storage.
//! - Validate creation input before it reaches any storage path.
//!
//! # Invariants
//! - Every item is identified by an `ItemId` assigned by storage, never by callers.
//! - `created_at` is set once at creation and never changes.

pub mod item;
