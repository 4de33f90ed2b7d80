//! Process-wide storage state.
//!
//! # Responsibility
//! - Hold the preferred storage mode.
//! - Own the in-memory item collection used whenever the database is not serving.

mod register;

pub use register::{StorageMode, StorageModeRegister};
