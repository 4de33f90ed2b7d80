//! SQLite connectivity and schema bootstrap.
//!
//! # Responsibility
//! - Probe database availability with a bounded retry budget.
//! - Ensure the `items` schema exists before the database is preferred.
//!
//! # Invariants
//! - Failing to connect is a normal outcome, reported as `None`, never as an error.
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Every connection opened here is released when its owner goes out of scope.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod probe;
mod schema;

pub use probe::{connect, connect_existing, probe, probe_existing};
pub use schema::{ensure_schema, initialize, SAMPLE_ITEMS};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
