//! Connection prober for the SQLite store.
//!
//! # Responsibility
//! - Open a usable connection within a bounded number of attempts.
//! - Treat "database unavailable" as an expected outcome.
//!
//! # Invariants
//! - At least one attempt is made, even for a zero retry budget.
//! - No delay follows the final attempt.
//! - A returned connection has already answered a query.

use super::DbResult;
use crate::config::DatabaseConfig;
use log::{debug, warn};
use rusqlite::{Connection, OpenFlags};
use std::thread;
use std::time::{Duration, Instant};

/// Probes the database up to `retries` times, sleeping `delay` between failures.
///
/// Creates the database file when `config.create_if_missing` allows it.
/// Returns `None` once every attempt failed.
///
/// # Side effects
/// - Blocks the calling thread for `delay` between attempts.
/// - Emits one `db_probe` warning per failed attempt.
pub fn probe(config: &DatabaseConfig, retries: u32, delay: Duration) -> Option<Connection> {
    probe_with(config, retries, delay, connect)
}

/// Like [`probe`], but never creates the database file.
///
/// Used after startup, where a missing file means the database went away
/// rather than that it still has to be provisioned.
pub fn probe_existing(
    config: &DatabaseConfig,
    retries: u32,
    delay: Duration,
) -> Option<Connection> {
    probe_with(config, retries, delay, connect_existing)
}

fn probe_with(
    config: &DatabaseConfig,
    retries: u32,
    delay: Duration,
    open: fn(&DatabaseConfig) -> DbResult<Connection>,
) -> Option<Connection> {
    let attempts = retries.max(1);

    for attempt in 1..=attempts {
        let started_at = Instant::now();
        match open(config) {
            Ok(conn) => {
                debug!(
                    "event=db_probe module=db status=ok attempt={attempt}/{attempts} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Some(conn);
            }
            Err(err) => {
                warn!(
                    "event=db_probe module=db status=error attempt={attempt}/{attempts} path={} duration_ms={} error={}",
                    config.path.display(),
                    started_at.elapsed().as_millis(),
                    err
                );
                if attempt < attempts && !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
        }
    }

    None
}

/// Opens one connection and verifies that it can serve a query.
///
/// Creates the file when `config.create_if_missing` is set.
/// SQLite opens files lazily, so a missing header or a foreign file only
/// surfaces on first read; the `sqlite_master` count forces that read.
pub fn connect(config: &DatabaseConfig) -> DbResult<Connection> {
    open_with(config, config.create_if_missing)
}

/// Opens an already existing database; a missing file is an error.
pub fn connect_existing(config: &DatabaseConfig) -> DbResult<Connection> {
    open_with(config, false)
}

fn open_with(config: &DatabaseConfig, create: bool) -> DbResult<Connection> {
    let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
        | OpenFlags::SQLITE_OPEN_URI;
    if create {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }

    let conn = Connection::open_with_flags(&config.path, flags)?;
    conn.busy_timeout(config.connect_timeout)?;
    conn.query_row("SELECT count(*) FROM sqlite_master;", [], |row| {
        row.get::<_, i64>(0)
    })?;

    Ok(conn)
}
