//! Item domain model.
//!
//! # Responsibility
//! - Define the record returned by every storage path.
//! - Provide the validated creation input (`NewItem`).
//!
//! # Invariants
//! - `name` is never blank for a persisted item.
//! - `id` and `created_at` are authoritative values assigned by storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identifier assigned by SQLite `AUTOINCREMENT` or by the in-memory counter.
pub type ItemId = i64;

/// Canonical item record.
///
/// Serialized shape is identical whichever storage path served the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    /// UTC creation time, RFC 3339 on the wire.
    pub created_at: DateTime<Utc>,
}

/// Validation failures for item creation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    /// `name` was missing, empty, or whitespace only.
    EmptyName,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
        }
    }
}

impl Error for ItemValidationError {}

/// Creation input that already passed validation.
///
/// Carries no `id` or `created_at`: both are assigned by the storage path
/// that persists the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    name: String,
    description: Option<String>,
}

impl NewItem {
    /// Builds creation input, rejecting blank names.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, ItemValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ItemValidationError::EmptyName);
        }

        Ok(Self { name, description })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Materializes the persisted record with storage-assigned identity.
    pub fn into_item(self, id: ItemId, created_at: DateTime<Utc>) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemValidationError, NewItem};

    #[test]
    fn new_item_rejects_blank_names() {
        assert_eq!(
            NewItem::new("", None).unwrap_err(),
            ItemValidationError::EmptyName
        );
        assert_eq!(
            NewItem::new(" \t\n", Some("desc".to_string())).unwrap_err(),
            ItemValidationError::EmptyName
        );
    }

    #[test]
    fn new_item_keeps_name_verbatim() {
        let item = NewItem::new(" Widget ", None).unwrap();
        assert_eq!(item.name(), " Widget ");
        assert_eq!(item.description(), None);
    }
}
