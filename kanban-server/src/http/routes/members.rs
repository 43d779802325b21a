//! Board member endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use kanban_core::{
    ActivityAction, BoardAction, BoardMember, Email, EntityType, MemberWithProfile, NewActivity,
    Role, ValidationError,
};

use super::{authorize, deleted, log_activity};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;
use crate::store::KanbanStore;

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateMemberRequest {
    pub role: Option<String>,
}

/// Parse a role handed out through this API; `owner` is never grantable.
fn grantable_role(raw: &str) -> Result<Role, ApiError> {
    let role: Role = raw.parse()?;
    if !role.grantable() {
        return Err(ApiError::BadRequest("The owner role cannot be granted".into()));
    }
    Ok(role)
}

/// Load a membership and check it belongs to `board_id`.
async fn board_member(
    store: &dyn KanbanStore,
    board_id: Uuid,
    member_id: Uuid,
) -> Result<BoardMember, ApiError> {
    store
        .member(member_id)
        .await?
        .filter(|m| m.board_id == board_id)
        .ok_or_else(|| ApiError::not_found("member"))
}

/// GET /api/boards/{board_id}/members
async fn list_members(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(board_id): ApiPath<Uuid>,
) -> Result<Json<Vec<MemberWithProfile>>, ApiError> {
    authorize(state.store(), board_id, user.id, BoardAction::View).await?;
    Ok(Json(state.store().members(board_id).await?))
}

/// POST /api/boards/{board_id}/members - invite an existing user by email
async fn add_member(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(board_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AddMemberRequest>,
) -> Result<(StatusCode, Json<MemberWithProfile>), ApiError> {
    let email = Email::new(req.email.as_deref().unwrap_or_default())?;
    let role = match req.role.as_deref() {
        Some(raw) => grantable_role(raw)?,
        None => Role::Member,
    };

    authorize(state.store(), board_id, user.id, BoardAction::ManageMembers).await?;

    let profile = state
        .store()
        .profile_by_email(&email)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("User not found. They need to create an account first.".into())
        })?;

    let member = state.store().add_member(board_id, profile.id, role).await?;

    tracing::info!(%board_id, user_id = %profile.id, %role, "member added");
    log_activity(
        state.store(),
        NewActivity {
            board_id,
            user_id: user.id,
            action: ActivityAction::Assigned,
            entity_type: EntityType::Member,
            entity_id: member.member.id,
            metadata: json!({ "member_name": profile.display_name(), "role": role }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(member)))
}

/// PATCH /api/boards/{board_id}/members/{member_id} - change a member's role
async fn update_member(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath((board_id, member_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateMemberRequest>,
) -> Result<Json<BoardMember>, ApiError> {
    let raw = req.role.as_deref().ok_or(ValidationError::Required {
        message: "Role is required",
    })?;
    let role = grantable_role(raw)?;

    authorize(state.store(), board_id, user.id, BoardAction::ManageMembers).await?;

    let member = board_member(state.store(), board_id, member_id).await?;
    if member.role == Role::Owner {
        return Err(ApiError::BadRequest("Cannot change the owner's role".into()));
    }

    let member = state.store().set_member_role(member_id, role).await?;
    tracing::info!(%board_id, %member_id, %role, "member role changed");

    Ok(Json(member))
}

/// DELETE /api/boards/{board_id}/members/{member_id}
async fn remove_member(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath((board_id, member_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    authorize(state.store(), board_id, user.id, BoardAction::ManageMembers).await?;

    let member = board_member(state.store(), board_id, member_id).await?;
    if member.role == Role::Owner {
        return Err(ApiError::BadRequest("Cannot remove the board owner".into()));
    }

    let member_name = match state
        .store()
        .members(board_id)
        .await?
        .into_iter()
        .find(|m| m.member.id == member_id)
        .and_then(|m| m.profile)
    {
        Some(profile) => profile.full_name.unwrap_or(profile.email),
        None => member.user_id.to_string(),
    };

    state.store().remove_member(member_id).await?;
    tracing::info!(%board_id, %member_id, "member removed");

    log_activity(
        state.store(),
        NewActivity {
            board_id,
            user_id: user.id,
            action: ActivityAction::Unassigned,
            entity_type: EntityType::Member,
            entity_id: member_id,
            metadata: json!({ "member_name": member_name }),
        },
    )
    .await;

    Ok(deleted("Member"))
}

/// Member routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/boards/{board_id}/members",
            get(list_members).post(add_member),
        )
        .route(
            "/boards/{board_id}/members/{member_id}",
            patch(update_member).delete(remove_member),
        )
}
