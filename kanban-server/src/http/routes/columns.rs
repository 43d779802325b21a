//! Column endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use kanban_core::{
    ActivityAction, BoardAction, Column, ColumnChanges, EntityType, NewActivity, NewColumn,
    Title, ValidationError,
};

use super::{authorize, deleted, load_column, log_activity, position};
use crate::http::error::ApiError;
use crate::http::extractors::{parse_id, ApiJson, ApiQuery, AuthUser, IdQuery};
use crate::reorder;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateColumnRequest {
    pub board_id: Option<String>,
    pub title: Option<String>,
    pub position: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateColumnRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub position: Option<i64>,
}

#[derive(Deserialize)]
pub struct MoveColumnRequest {
    pub column_id: Option<String>,
    pub new_position: Option<i64>,
}

/// POST /api/columns
async fn create_column(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateColumnRequest>,
) -> Result<(StatusCode, Json<Column>), ApiError> {
    const MISSING: &str = "Board ID and title are required";
    let board_id = parse_id(req.board_id.as_deref(), MISSING)?;
    let title = Title::required(req.title.as_deref(), MISSING)?;
    let position = req
        .position
        .map(|p| position(p, "position"))
        .transpose()?;

    authorize(state.store(), board_id, user.id, BoardAction::Edit).await?;

    let column = state
        .store()
        .create_column(NewColumn {
            board_id,
            title,
            position,
        })
        .await?;

    tracing::debug!(column_id = %column.id, %board_id, position = column.position, "column created");
    log_activity(
        state.store(),
        NewActivity {
            board_id,
            user_id: user.id,
            action: ActivityAction::Created,
            entity_type: EntityType::Column,
            entity_id: column.id,
            metadata: json!({ "title": column.title }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(column)))
}

/// PATCH /api/columns
async fn update_column(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<UpdateColumnRequest>,
) -> Result<Json<Column>, ApiError> {
    let column_id = parse_id(req.id.as_deref(), "Column ID is required")?;
    let changes = ColumnChanges {
        title: req
            .title
            .as_deref()
            .map(Title::new)
            .transpose()?
            .map(Title::into_string),
        position: req
            .position
            .map(|p| position(p, "position"))
            .transpose()?,
    };

    let column = load_column(state.store(), column_id).await?;
    authorize(state.store(), column.board_id, user.id, BoardAction::Edit).await?;

    let column = state.store().update_column(column_id, &changes).await?;

    log_activity(
        state.store(),
        NewActivity {
            board_id: column.board_id,
            user_id: user.id,
            action: ActivityAction::Updated,
            entity_type: EntityType::Column,
            entity_id: column.id,
            metadata: json!({ "title": column.title, "updates": changes }),
        },
    )
    .await;

    Ok(Json(column))
}

/// DELETE /api/columns?id= - owner or admin; cards go with it
async fn delete_column(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<Value>, ApiError> {
    let column_id = parse_id(query.id.as_deref(), "Column ID is required")?;

    let column = load_column(state.store(), column_id).await?;
    authorize(
        state.store(),
        column.board_id,
        user.id,
        BoardAction::DeleteColumn,
    )
    .await?;

    log_activity(
        state.store(),
        NewActivity {
            board_id: column.board_id,
            user_id: user.id,
            action: ActivityAction::Deleted,
            entity_type: EntityType::Column,
            entity_id: column.id,
            metadata: json!({ "title": column.title }),
        },
    )
    .await;

    state.store().delete_column(column_id).await?;
    tracing::info!(%column_id, board_id = %column.board_id, "column deleted");

    Ok(deleted("Column"))
}

/// POST /api/columns/move - returns the board's columns in their new order
async fn move_column(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<MoveColumnRequest>,
) -> Result<Json<Vec<Column>>, ApiError> {
    const MISSING: &str = "Column ID and new position are required";
    let column_id = parse_id(req.column_id.as_deref(), MISSING)?;
    let new_position = req
        .new_position
        .ok_or(ValidationError::Required { message: MISSING })?;
    let new_position = position(new_position, "new_position")? as usize;

    let column = load_column(state.store(), column_id).await?;
    authorize(state.store(), column.board_id, user.id, BoardAction::Edit).await?;

    let columns = reorder::move_column(state.store(), column_id, new_position).await?;

    let index = columns.iter().position(|c| c.id == column_id);
    log_activity(
        state.store(),
        NewActivity {
            board_id: column.board_id,
            user_id: user.id,
            action: ActivityAction::Moved,
            entity_type: EntityType::Column,
            entity_id: column_id,
            metadata: json!({ "title": column.title, "from": column.position, "to": index }),
        },
    )
    .await;

    Ok(Json(columns))
}

/// Column routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/columns",
            post(create_column)
                .patch(update_column)
                .delete(delete_column),
        )
        .route("/columns/move", post(move_column))
}
