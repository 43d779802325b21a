//! Route handlers organized by resource
//!
//! Shared helpers for the handlers: board permission checks, parent lookups
//! and best-effort activity logging.

pub mod activity;
pub mod boards;
pub mod cards;
pub mod columns;
pub mod comments;
pub mod health;
pub mod members;

use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use kanban_core::{BoardAction, BoardMember, Card, Column, NewActivity, ValidationError};

use crate::http::error::ApiError;
use crate::store::KanbanStore;

/// Require that `user_id` may perform `action` on the board.
///
/// Non-members and members whose role is too low both get `403 Access denied`.
pub(crate) async fn authorize(
    store: &dyn KanbanStore,
    board_id: Uuid,
    user_id: Uuid,
    action: BoardAction,
) -> Result<BoardMember, ApiError> {
    match store.membership(board_id, user_id).await? {
        Some(member) if action.allowed_for(Some(member.role)) => Ok(member),
        member => {
            tracing::debug!(
                %board_id,
                %user_id,
                ?action,
                role = ?member.map(|m| m.role),
                "access denied"
            );
            Err(ApiError::access_denied())
        }
    }
}

pub(crate) async fn load_column(
    store: &dyn KanbanStore,
    column_id: Uuid,
) -> Result<Column, ApiError> {
    store
        .column(column_id)
        .await?
        .ok_or_else(|| ApiError::not_found("column"))
}

/// A card together with the column it lives in.
pub(crate) async fn load_card(
    store: &dyn KanbanStore,
    card_id: Uuid,
) -> Result<(Card, Column), ApiError> {
    let card = store
        .card(card_id)
        .await?
        .ok_or_else(|| ApiError::not_found("card"))?;
    let column = load_column(store, card.column_id).await?;
    Ok((card, column))
}

/// Validate a client-supplied position or index.
pub(crate) fn position(value: i64, field: &'static str) -> Result<i32, ApiError> {
    if value < 0 {
        return Err(ValidationError::Negative { field }.into());
    }
    i32::try_from(value).map_err(|_| {
        ApiError::Validation(ValidationError::InvalidFormat {
            field,
            reason: "out of range",
        })
    })
}

/// Record an activity entry. Failures are logged and swallowed.
pub(crate) async fn log_activity(store: &dyn KanbanStore, activity: NewActivity) {
    let (board_id, action, entity_type) =
        (activity.board_id, activity.action, activity.entity_type);

    if let Err(e) = store.record_activity(activity).await {
        tracing::warn!(
            %board_id,
            action = action.as_str(),
            entity_type = entity_type.as_str(),
            error = %e,
            "failed to record activity"
        );
    }
}

/// `{"message": "<what> deleted successfully"}`
pub(crate) fn deleted(what: &str) -> Json<Value> {
    Json(json!({ "message": format!("{what} deleted successfully") }))
}
