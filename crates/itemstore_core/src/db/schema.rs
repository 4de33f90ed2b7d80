//! Startup schema initialization and storage mode decision.
//!
//! # Responsibility
//! - Decide the preferred storage mode once at process start.
//! - Create the `items` table and optional sample rows when the database is usable.
//!
//! # Invariants
//! - Initialization never fails the process; every failure degrades to in-memory mode.
//! - Sample rows are only inserted into an empty table.
//! - The startup connection is released before the decision is returned.

use super::migrations::apply_migrations;
use super::{probe, DbResult};
use crate::config::DatabaseConfig;
use crate::storage::{StorageMode, StorageModeRegister};
use log::{debug, error, info, warn};
use rusqlite::{params, Connection};
use std::time::Instant;

/// Rows inserted into an empty table when sample seeding is enabled.
pub const SAMPLE_ITEMS: &[(&str, Option<&str>)] = &[
    ("Sample Item 1", Some("This is a sample item")),
    ("Sample Item 2", Some("Another sample item")),
];

/// Probes the database, ensures the schema, and records the preferred mode.
///
/// # Side effects
/// - Sets `register` mode.
/// - Emits `schema_init` and `storage_mode` logging events.
pub fn initialize(config: &DatabaseConfig, register: &StorageModeRegister) -> StorageMode {
    let started_at = Instant::now();
    info!(
        "event=schema_init module=db status=start path={} retries={} delay_ms={}",
        config.path.display(),
        config.startup_retries,
        config.startup_retry_delay.as_millis()
    );

    let mode = match probe(config, config.startup_retries, config.startup_retry_delay) {
        None => {
            warn!(
                "event=schema_init module=db status=unavailable duration_ms={}",
                started_at.elapsed().as_millis()
            );
            StorageMode::InMemory
        }
        Some(mut conn) => match ensure_schema(&mut conn, config.seed_sample_items) {
            Ok(seeded) => {
                info!(
                    "event=schema_init module=db status=ok seeded_rows={seeded} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                StorageMode::Database
            }
            Err(err) => {
                error!(
                    "event=schema_init module=db status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                StorageMode::InMemory
            }
        },
    };

    register.set_mode(mode);
    info!("event=storage_mode module=db status=resolved mode={}", mode.as_str());
    mode
}

/// Applies pending migrations and seeds an empty table when requested.
///
/// Returns the number of sample rows inserted. Safe to call repeatedly.
pub fn ensure_schema(conn: &mut Connection, seed_sample_items: bool) -> DbResult<usize> {
    let migrated = apply_migrations(conn)?;
    debug!("event=schema_init module=db status=migrated applied={migrated}");

    if !seed_sample_items {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    let existing: i64 = tx.query_row("SELECT count(*) FROM items;", [], |row| row.get(0))?;
    if existing > 0 {
        return Ok(0);
    }

    for (name, description) in SAMPLE_ITEMS {
        tx.execute(
            "INSERT INTO items (name, description) VALUES (?1, ?2);",
            params![name, description],
        )?;
    }
    tx.commit()?;

    Ok(SAMPLE_ITEMS.len())
}
