//! Insert and partial-update inputs handed to the stores
//!
//! Values here are already validated. For partial updates an outer `None`
//! leaves the column untouched; `Some(None)` clears a nullable column.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{ActivityAction, EntityType, Title};

#[derive(Debug, Clone)]
pub struct NewBoard {
    pub owner_id: Uuid,
    pub title: Title,
    pub description: Option<String>,
}

/// Titles of the columns every new board starts with, in order
pub const DEFAULT_COLUMNS: [&str; 3] = ["To Do", "In Progress", "Done"];

#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

impl BoardChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewColumn {
    pub board_id: Uuid,
    pub title: Title,
    /// `None` appends after the last column
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ColumnChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewCard {
    pub column_id: Uuid,
    pub title: Title,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    /// `None` appends after the last card
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CardChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

impl CardChanges {
    /// Changed fields as a JSON object, for the `updates` key of activity metadata.
    pub fn to_metadata(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub card_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub board_id: Uuid,
    pub user_id: Uuid,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub metadata: serde_json::Value,
}
