//! Board activity feed

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use kanban_core::{
    ActivityAction, ActivityEntry, ActivityLog, BoardAction, EntityType, NewActivity,
    ValidationError,
};

use super::authorize;
use crate::http::error::ApiError;
use crate::http::extractors::{parse_id, ApiJson, ApiQuery, AuthUser};
use crate::state::AppState;

/// Entries returned when `limit` is absent
pub const DEFAULT_LIMIT: i64 = 50;
/// Upper bound for `limit`
pub const MAX_LIMIT: i64 = 200;

#[derive(Deserialize)]
pub struct ActivityQuery {
    #[serde(rename = "boardId")]
    pub board_id: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct RecordActivityRequest {
    pub board_id: Option<String>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// GET /api/activity?boardId=&limit= - newest first
async fn list_activity(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<ActivityQuery>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
    let board_id = parse_id(query.board_id.as_deref(), "Board ID is required")?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    authorize(state.store(), board_id, user.id, BoardAction::View).await?;

    Ok(Json(state.store().activity(board_id, limit).await?))
}

/// POST /api/activity - record an entry on behalf of the caller
async fn record_activity(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<RecordActivityRequest>,
) -> Result<(StatusCode, Json<ActivityLog>), ApiError> {
    const MISSING: &str = "Missing required fields";
    let board_id = parse_id(req.board_id.as_deref(), MISSING)?;
    let entity_id = parse_id(req.entity_id.as_deref(), MISSING)?;
    let action: ActivityAction = req
        .action
        .as_deref()
        .ok_or(ValidationError::Required { message: MISSING })?
        .parse()?;
    let entity_type: EntityType = req
        .entity_type
        .as_deref()
        .ok_or(ValidationError::Required { message: MISSING })?
        .parse()?;

    authorize(state.store(), board_id, user.id, BoardAction::View).await?;

    let log = state
        .store()
        .record_activity(NewActivity {
            board_id,
            user_id: user.id,
            action,
            entity_type,
            entity_id,
            metadata: req.metadata.unwrap_or_else(|| serde_json::json!({})),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(log)))
}

/// Activity routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/activity", get(list_activity).post(record_activity))
}

#[cfg(test)]
mod tests {
    use crate::http::routes::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn feed_is_newest_first() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let (board_id, columns) = app.board(&owner, "Board").await;
        app.card(&owner, &columns[0], "First task").await;

        let (status, feed) = app
            .get(&format!("/api/activity?boardId={board_id}"), &owner)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(feed[0]["action"], "created");
        assert_eq!(feed[0]["entity_type"], "card");
        assert_eq!(feed[0]["metadata"]["title"], "First task");
        assert_eq!(feed[0]["user"]["email"], "owner@example.com");
        assert_eq!(feed[1]["entity_type"], "board");
    }

    #[tokio::test]
    async fn limit_is_clamped() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let (board_id, columns) = app.board(&owner, "Board").await;
        app.card(&owner, &columns[0], "a").await;
        app.card(&owner, &columns[0], "b").await;

        let (_, feed) = app
            .get(&format!("/api/activity?boardId={board_id}&limit=0"), &owner)
            .await;
        assert_eq!(feed.as_array().unwrap().len(), 1);

        let (_, feed) = app
            .get(&format!("/api/activity?boardId={board_id}&limit=1000"), &owner)
            .await;
        assert_eq!(feed.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn feed_requires_membership() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let mallory = app.user("mallory@example.com").await;
        let (board_id, _) = app.board(&owner, "Board").await;

        let (status, _) = app
            .get(&format!("/api/activity?boardId={board_id}"), &mallory)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.get("/api/activity", &owner).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Board ID is required");
    }

    #[tokio::test]
    async fn record_activity_by_hand() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let (board_id, _) = app.board(&owner, "Board").await;

        let (status, log) = app
            .post(
                "/api/activity",
                &owner,
                json!({
                    "board_id": board_id,
                    "action": "updated",
                    "entity_type": "board",
                    "entity_id": board_id,
                    "metadata": { "note": "renamed offline" },
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{log}");
        assert_eq!(log["metadata"]["note"], "renamed offline");

        let (status, _) = app
            .post(
                "/api/activity",
                &owner,
                json!({
                    "board_id": board_id,
                    "action": "exploded",
                    "entity_type": "board",
                    "entity_id": board_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .post("/api/activity", &owner, json!({ "board_id": board_id }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields");
    }
}
