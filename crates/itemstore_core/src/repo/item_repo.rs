//! Item repository over the SQLite `items` table.
//!
//! # Responsibility
//! - Provide list/get/create/delete over canonical `items` storage.
//! - Read back database-assigned `id` and `created_at` on create.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - Listing is always ordered by ascending id.

use crate::db::DbError;
use crate::model::item::{Item, ItemId, NewItem};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    created_at
FROM items";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// SQLite-backed item repository borrowing one probed connection.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn list_items(&self) -> RepoResult<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }

        Ok(items)
    }

    pub fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }

        Ok(None)
    }

    /// Inserts a row and returns it exactly as persisted.
    pub fn create_item(&self, item: &NewItem) -> RepoResult<Item> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO items (name, description, created_at)
             VALUES (?1, ?2, ?3)
             RETURNING id, name, description, created_at;",
        )?;

        let mut rows = stmt.query(params![item.name(), item.description(), Utc::now()])?;
        if let Some(row) = rows.next()? {
            return parse_item_row(row);
        }

        Err(RepoError::InvalidData("insert returned no row".to_string()))
    }

    /// Deletes by id; returns whether a row existed.
    pub fn delete_item(&self, id: ItemId) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM items WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let id: ItemId = row.get("id")?;

    let name: String = row.get("name")?;
    if name.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "blank name in items.name for id {id}"
        )));
    }

    let created_at = match row.get::<_, Value>("created_at")? {
        Value::Text(text) => parse_timestamp(&text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid timestamp `{text}` in items.created_at for id {id}"
            ))
        })?,
        other => {
            return Err(RepoError::InvalidData(format!(
                "unexpected {:?} value in items.created_at for id {id}",
                other.data_type()
            )));
        }
    };

    Ok(Item {
        id,
        name,
        description: row.get("description")?,
        created_at,
    })
}

/// Accepts RFC 3339 and the offset/naive forms SQLite and rusqlite write.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}
