//! Card comment endpoints

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
    ActivityAction, BoardAction, Comment, CommentBody, CommentWithAuthor, EntityType, NewActivity,
    NewComment, ValidationError,
};

use super::{authorize, deleted, load_card, log_activity};
use crate::http::error::ApiError;
use crate::http::extractors::{parse_id, ApiJson, ApiQuery, AuthUser, IdQuery};
use crate::state::AppState;
use crate::store::KanbanStore;

#[derive(Deserialize)]
pub struct CommentsQuery {
    #[serde(rename = "cardId")]
    pub card_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub card_id: Option<String>,
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    pub id: Option<String>,
    pub content: Option<String>,
}

/// Load a comment the caller wrote; anyone else gets 403.
async fn own_comment(
    store: &dyn KanbanStore,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<Comment, ApiError> {
    let comment = store
        .comment(comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("comment"))?;

    if comment.user_id != user_id {
        return Err(ApiError::access_denied());
    }
    Ok(comment)
}

/// GET /api/comments?cardId= - oldest first
async fn list_comments(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<CommentsQuery>,
) -> Result<Json<Vec<CommentWithAuthor>>, ApiError> {
    let card_id = parse_id(query.card_id.as_deref(), "Card ID is required")?;

    let (_, column) = load_card(state.store(), card_id).await?;
    authorize(state.store(), column.board_id, user.id, BoardAction::View).await?;

    Ok(Json(state.store().comments(card_id).await?))
}

/// POST /api/comments
async fn create_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentWithAuthor>), ApiError> {
    const MISSING: &str = "Card ID and content are required";
    let card_id = parse_id(req.card_id.as_deref(), MISSING)?;
    let content = req
        .content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or(ValidationError::Required { message: MISSING })?;
    let content = CommentBody::new(content)?;

    let (card, column) = load_card(state.store(), card_id).await?;
    authorize(state.store(), column.board_id, user.id, BoardAction::Edit).await?;

    let comment = state
        .store()
        .create_comment(NewComment {
            card_id,
            user_id: user.id,
            content: content.into_string(),
        })
        .await?;

    log_activity(
        state.store(),
        NewActivity {
            board_id: column.board_id,
            user_id: user.id,
            action: ActivityAction::Commented,
            entity_type: EntityType::Comment,
            entity_id: comment.comment.id,
            metadata: json!({ "card_title": card.title }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// PATCH /api/comments - author only
async fn update_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<UpdateCommentRequest>,
) -> Result<Json<CommentWithAuthor>, ApiError> {
    let comment_id = parse_id(req.id.as_deref(), "Comment ID is required")?;
    let content = CommentBody::new(req.content.as_deref().unwrap_or_default())?;

    own_comment(state.store(), comment_id, user.id).await?;
    let comment = state
        .store()
        .update_comment(comment_id, content.as_str())
        .await?;

    Ok(Json(comment))
}

/// DELETE /api/comments?id= - author only
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<Value>, ApiError> {
    let comment_id = parse_id(query.id.as_deref(), "Comment ID is required")?;

    let comment = own_comment(state.store(), comment_id, user.id).await?;
    state.store().delete_comment(comment_id).await?;
    tracing::info!(%comment_id, card_id = %comment.card_id, "comment deleted");

    Ok(deleted("Comment"))
}

/// Comment routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/comments",
        get(list_comments)
            .post(create_comment)
            .patch(update_comment)
            .delete(delete_comment),
    )
}

#[cfg(test)]
mod tests {
    use crate::http::routes::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn comment_lifecycle() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let (_, columns) = app.board(&owner, "Board").await;
        let card_id = app.card(&owner, &columns[0], "Discuss").await;

        for text in ["first", "second"] {
            let (status, comment) = app
                .post("/api/comments", &owner, json!({ "card_id": card_id, "content": text }))
                .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(comment["user"]["email"], "owner@example.com");
        }

        let (status, list) = app.get(&format!("/api/comments?cardId={card_id}"), &owner).await;
        assert_eq!(status, StatusCode::OK);
        let texts: Vec<&str> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["content"].as_str().unwrap())
            .collect();
        assert_eq!(texts, vec!["first", "second"]);

        let id = list[0]["id"].as_str().unwrap();
        let (status, edited) = app
            .patch("/api/comments", &owner, json!({ "id": id, "content": "first!" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["content"], "first!");
    }

    #[tokio::test]
    async fn only_the_author_deletes_a_comment() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let bob = app.user("bob@example.com").await;
        let (board_id, columns) = app.board(&owner, "Board").await;
        app.post(
            &format!("/api/boards/{board_id}/members"),
            &owner,
            json!({ "email": "bob@example.com", "role": "admin" }),
        )
        .await;
        let card_id = app.card(&owner, &columns[0], "Discuss").await;

        let (_, comment) = app
            .post("/api/comments", &bob, json!({ "card_id": card_id, "content": "mine" }))
            .await;
        let id = comment["id"].as_str().unwrap();

        let (status, body) = app.delete(&format!("/api/comments?id={id}"), &owner).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Access denied");

        let (status, _) = app
            .patch("/api/comments", &owner, json!({ "id": id, "content": "edited" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.delete(&format!("/api/comments?id={id}"), &bob).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Comment deleted successfully");
    }

    #[tokio::test]
    async fn comments_require_card_and_content() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;

        let (status, body) = app.get("/api/comments", &owner).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Card ID is required");

        let (status, body) = app
            .post("/api/comments", &owner, json!({ "card_id": uuid::Uuid::new_v4() }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Card ID and content are required");
    }

    #[tokio::test]
    async fn non_members_cannot_read_comments() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let mallory = app.user("mallory@example.com").await;
        let (_, columns) = app.board(&owner, "Board").await;
        let card_id = app.card(&owner, &columns[0], "Secret").await;

        let (status, _) = app
            .get(&format!("/api/comments?cardId={card_id}"), &mallory)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
