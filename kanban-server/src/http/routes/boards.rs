//! Board endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use kanban_core::{
    fields, ActivityAction, Board, BoardAction, BoardChanges, BoardDetails, BoardSummary,
    EntityType, NewActivity, NewBoard, Title,
};

use super::{authorize, deleted, log_activity};
use crate::http::error::ApiError;
use crate::http::extractors::{double_option, ApiJson, ApiPath, AuthUser};
use crate::state::AppState;

/// Create board request
#[derive(Deserialize)]
pub struct CreateBoardRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Update board request; absent fields are left untouched
#[derive(Deserialize)]
pub struct UpdateBoardRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// GET /api/boards - boards the caller belongs to
async fn list_boards(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<BoardSummary>>, ApiError> {
    let boards = state.store().boards_for_user(user.id).await?;
    Ok(Json(boards))
}

/// POST /api/boards - create a board with the default columns
async fn create_board(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateBoardRequest>,
) -> Result<(StatusCode, Json<Board>), ApiError> {
    let title = Title::required(req.title.as_deref(), "Title is required")?;
    let description = fields::description(req.description.as_deref())?;

    let board = state
        .store()
        .create_board(NewBoard {
            owner_id: user.id,
            title,
            description,
        })
        .await?;

    tracing::info!(board_id = %board.id, owner_id = %user.id, "board created");
    log_activity(
        state.store(),
        NewActivity {
            board_id: board.id,
            user_id: user.id,
            action: ActivityAction::Created,
            entity_type: EntityType::Board,
            entity_id: board.id,
            metadata: json!({ "title": board.title }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(board)))
}

/// GET /api/boards/{board_id} - board with columns, cards and members
async fn get_board(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(board_id): ApiPath<Uuid>,
) -> Result<Json<BoardDetails>, ApiError> {
    let details = state
        .store()
        .board_details(board_id)
        .await?
        .ok_or_else(|| ApiError::not_found("board"))?;
    authorize(state.store(), board_id, user.id, BoardAction::View).await?;

    Ok(Json(details))
}

/// PATCH /api/boards/{board_id} - owner or admin
async fn update_board(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(board_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateBoardRequest>,
) -> Result<Json<Board>, ApiError> {
    authorize(state.store(), board_id, user.id, BoardAction::Configure).await?;

    let changes = BoardChanges {
        title: req
            .title
            .as_deref()
            .map(Title::new)
            .transpose()?
            .map(Title::into_string),
        description: req
            .description
            .map(|d| fields::description(d.as_deref()))
            .transpose()?,
    };

    let board = state.store().update_board(board_id, &changes).await?;

    log_activity(
        state.store(),
        NewActivity {
            board_id,
            user_id: user.id,
            action: ActivityAction::Updated,
            entity_type: EntityType::Board,
            entity_id: board_id,
            metadata: json!({ "title": board.title, "updates": changes }),
        },
    )
    .await;

    Ok(Json(board))
}

/// DELETE /api/boards/{board_id} - owner only
async fn delete_board(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiPath(board_id): ApiPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    // a missing board answers the same as someone else's board
    match state.store().board(board_id).await? {
        Some(board) if board.owner_id == user.id => {}
        _ => return Err(ApiError::access_denied()),
    }

    state.store().delete_board(board_id).await?;
    tracing::info!(%board_id, "board deleted");

    Ok(deleted("Board"))
}

/// Board routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/boards", get(list_boards).post(create_board))
        .route(
            "/boards/{board_id}",
            get(get_board).patch(update_board).delete(delete_board),
        )
}

#[cfg(test)]
mod tests {
    use crate::http::routes::test_support::TestApp;
    use crate::store::KanbanStore;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn create_board_yields_default_columns_and_owner() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;

        let (status, board) = app
            .post("/api/boards", &owner, json!({ "title": "  Roadmap  ", "description": "" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(board["title"], "Roadmap");
        assert!(board["description"].is_null());

        let id = board["id"].as_str().unwrap();
        let (status, details) = app.get(&format!("/api/boards/{id}"), &owner).await;
        assert_eq!(status, StatusCode::OK);

        let columns: Vec<(&str, i64)> = details["columns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| (c["title"].as_str().unwrap(), c["position"].as_i64().unwrap()))
            .collect();
        assert_eq!(columns, vec![("To Do", 0), ("In Progress", 1), ("Done", 2)]);
        assert_eq!(details["members"][0]["role"], "owner");
        assert_eq!(details["owner"]["email"], "owner@example.com");
    }

    #[tokio::test]
    async fn create_board_requires_title() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;

        let (status, body) = app.post("/api/boards", &owner, json!({ "title": "   " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Title is required");
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_request_body() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;

        let (status, body) = app
            .post("/api/boards", &owner, json!({ "title": 42 }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn list_shows_only_member_boards() {
        let app = TestApp::new();
        let alice = app.user("alice@example.com").await;
        let bob = app.user("bob@example.com").await;
        app.board(&alice, "Alice's").await;

        let (_, mine) = app.get("/api/boards", &alice).await;
        assert_eq!(mine.as_array().unwrap().len(), 1);
        assert_eq!(mine[0]["member_count"], 1);

        let (_, theirs) = app.get("/api/boards", &bob).await;
        assert!(theirs.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_members_cannot_view_a_board() {
        let app = TestApp::new();
        let alice = app.user("alice@example.com").await;
        let mallory = app.user("mallory@example.com").await;
        let (board_id, _) = app.board(&alice, "Private").await;

        let (status, body) = app.get(&format!("/api/boards/{board_id}"), &mallory).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Access denied");
    }

    #[tokio::test]
    async fn unknown_board_is_404() {
        let app = TestApp::new();
        let alice = app.user("alice@example.com").await;

        let (status, body) = app
            .get(&format!("/api/boards/{}", uuid::Uuid::new_v4()), &alice)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Board not found");
    }

    #[tokio::test]
    async fn patch_clears_description_with_null() {
        let app = TestApp::new();
        let alice = app.user("alice@example.com").await;
        let (status, board) = app
            .post("/api/boards", &alice, json!({ "title": "Plan", "description": "draft" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = board["id"].as_str().unwrap();

        let (status, updated) = app
            .patch(&format!("/api/boards/{id}"), &alice, json!({ "title": "Plan B" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Plan B");
        assert_eq!(updated["description"], "draft");

        let (_, cleared) = app
            .patch(&format!("/api/boards/{id}"), &alice, json!({ "description": null }))
            .await;
        assert!(cleared["description"].is_null());
    }

    #[tokio::test]
    async fn only_the_owner_deletes_a_board() {
        let app = TestApp::new();
        let alice = app.user("alice@example.com").await;
        let bob = app.user("bob@example.com").await;
        let (board_id, _) = app.board(&alice, "Shared").await;

        let (status, _) = app
            .post(
                &format!("/api/boards/{board_id}/members"),
                &alice,
                json!({ "email": "bob@example.com", "role": "admin" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = app.delete(&format!("/api/boards/{board_id}"), &bob).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.delete(&format!("/api/boards/{board_id}"), &alice).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Board deleted successfully");

        let id = board_id.parse().unwrap();
        assert!(app.store.board(id).await.unwrap().is_none());
        assert!(app.store.columns(id).await.unwrap().is_empty());
    }
}
