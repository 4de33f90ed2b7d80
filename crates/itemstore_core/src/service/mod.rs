//! Core use-case services.
//!
//! # Responsibility
//! - Expose the item operations callers use, independent of the active storage.
//! - Keep the HTTP layer decoupled from probing and fallback decisions.

pub mod item_service;
