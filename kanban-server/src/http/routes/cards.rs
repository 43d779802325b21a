//! Card endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use kanban_core::{
    fields, ActivityAction, BoardAction, Card, CardChanges, CardMove, CardWithAssignee,
    EntityType, MoveError, NewActivity, NewCard, Title, ValidationError,
};

use super::{authorize, deleted, load_card, load_column, log_activity, position};
use crate::http::error::ApiError;
use crate::http::extractors::{double_option, parse_id, ApiJson, ApiQuery, AuthUser, IdQuery};
use crate::reorder;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCardRequest {
    pub column_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub position: Option<i64>,
}

/// Update card request; `description`, `assignee_id` and `due_date` accept
/// an explicit `null` to clear them
#[derive(Deserialize)]
pub struct UpdateCardRequest {
    pub id: Option<String>,
    pub column_id: Option<Uuid>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub position: Option<i64>,
}

#[derive(Deserialize)]
pub struct MoveCardRequest {
    pub card_id: Option<String>,
    pub source_column_id: Option<String>,
    pub destination_column_id: Option<String>,
    pub new_position: Option<i64>,
}

/// Cards of both columns touched by a move, in their new order
#[derive(Serialize)]
pub struct MoveCardResponse {
    pub card: Card,
    pub destination: Vec<Card>,
    pub source: Vec<Card>,
}

/// POST /api/cards
async fn create_card(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardWithAssignee>), ApiError> {
    const MISSING: &str = "Column ID and title are required";
    let column_id = parse_id(req.column_id.as_deref(), MISSING)?;
    let title = Title::required(req.title.as_deref(), MISSING)?;
    let description = fields::description(req.description.as_deref())?;
    let position = req
        .position
        .map(|p| position(p, "position"))
        .transpose()?;

    let column = load_column(state.store(), column_id).await?;
    authorize(state.store(), column.board_id, user.id, BoardAction::Edit).await?;

    let card = state
        .store()
        .create_card(NewCard {
            column_id,
            title,
            description,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
            position,
        })
        .await?;

    tracing::debug!(card_id = %card.card.id, %column_id, position = card.card.position, "card created");
    log_activity(
        state.store(),
        NewActivity {
            board_id: column.board_id,
            user_id: user.id,
            action: ActivityAction::Created,
            entity_type: EntityType::Card,
            entity_id: card.card.id,
            metadata: json!({ "title": card.card.title, "column": column.title }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(card)))
}

/// PATCH /api/cards
async fn update_card(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<UpdateCardRequest>,
) -> Result<Json<CardWithAssignee>, ApiError> {
    let card_id = parse_id(req.id.as_deref(), "Card ID is required")?;
    let changes = CardChanges {
        column_id: req.column_id,
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
        assignee_id: req.assignee_id,
        due_date: req.due_date,
        position: req
            .position
            .map(|p| position(p, "position"))
            .transpose()?,
    };

    let (before, column) = load_card(state.store(), card_id).await?;
    authorize(state.store(), column.board_id, user.id, BoardAction::Edit).await?;

    if let Some(target) = changes.column_id.filter(|id| *id != column.id) {
        let target = load_column(state.store(), target).await?;
        if target.board_id != column.board_id {
            return Err(MoveError::CrossBoard.into());
        }
    }

    let card = state.store().update_card(card_id, &changes).await?;

    log_activity(
        state.store(),
        NewActivity {
            board_id: column.board_id,
            user_id: user.id,
            action: ActivityAction::Updated,
            entity_type: EntityType::Card,
            entity_id: card_id,
            metadata: json!({ "title": card.card.title, "updates": changes.to_metadata() }),
        },
    )
    .await;

    if let Some(assignee_id) = changes.assignee_id.filter(|a| *a != before.assignee_id) {
        let (action, assignee) = match assignee_id {
            Some(id) => (ActivityAction::Assigned, id),
            None => (
                ActivityAction::Unassigned,
                before.assignee_id.unwrap_or_default(),
            ),
        };
        log_activity(
            state.store(),
            NewActivity {
                board_id: column.board_id,
                user_id: user.id,
                action,
                entity_type: EntityType::Card,
                entity_id: card_id,
                metadata: json!({ "title": card.card.title, "assignee_id": assignee }),
            },
        )
        .await;
    }

    Ok(Json(card))
}

/// DELETE /api/cards?id=
async fn delete_card(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<Value>, ApiError> {
    let card_id = parse_id(query.id.as_deref(), "Card ID is required")?;

    let (card, column) = load_card(state.store(), card_id).await?;
    authorize(state.store(), column.board_id, user.id, BoardAction::Edit).await?;

    log_activity(
        state.store(),
        NewActivity {
            board_id: column.board_id,
            user_id: user.id,
            action: ActivityAction::Deleted,
            entity_type: EntityType::Card,
            entity_id: card_id,
            metadata: json!({ "title": card.title }),
        },
    )
    .await;

    state.store().delete_card(card_id).await?;
    tracing::info!(%card_id, column_id = %column.id, "card deleted");

    Ok(deleted("Card"))
}

/// POST /api/cards/move - reorder within a column or move across columns
async fn move_card(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<MoveCardRequest>,
) -> Result<Json<MoveCardResponse>, ApiError> {
    const MISSING: &str = "Missing required fields";
    let card_id = parse_id(req.card_id.as_deref(), MISSING)?;
    let source_column_id = parse_id(req.source_column_id.as_deref(), MISSING)?;
    let destination_column_id = parse_id(req.destination_column_id.as_deref(), MISSING)?;
    let new_position = req
        .new_position
        .ok_or(ValidationError::Required { message: MISSING })?;
    let new_position = position(new_position, "new_position")? as usize;

    let source = load_column(state.store(), source_column_id).await?;
    authorize(state.store(), source.board_id, user.id, BoardAction::Edit).await?;

    let outcome = reorder::move_card(
        state.store(),
        &CardMove {
            card_id,
            source_column_id,
            destination_column_id,
            new_position,
        },
    )
    .await?;

    if outcome.plan.crosses_columns() {
        log_activity(
            state.store(),
            NewActivity {
                board_id: source.board_id,
                user_id: user.id,
                action: ActivityAction::Moved,
                entity_type: EntityType::Card,
                entity_id: card_id,
                metadata: json!({
                    "title": outcome.card.title,
                    "from_column": outcome.source_column.title,
                    "to_column": outcome.destination_column.title,
                }),
            },
        )
        .await;
    }

    Ok(Json(MoveCardResponse {
        card: outcome.card,
        destination: outcome.destination,
        source: outcome.source,
    }))
}

/// Card routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/cards",
            post(create_card).patch(update_card).delete(delete_card),
        )
        .route("/cards/move", post(move_card))
}

#[cfg(test)]
mod tests {
    use crate::http::routes::test_support::{TestApp, TestUser};
    use crate::store::KanbanStore;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    fn ids_and_positions(cards: &Value) -> Vec<(String, i64)> {
        cards
            .as_array()
            .unwrap()
            .iter()
            .map(|c| {
                (
                    c["id"].as_str().unwrap().to_string(),
                    c["position"].as_i64().unwrap(),
                )
            })
            .collect()
    }

    async fn seeded(app: &TestApp, owner: &TestUser) -> (Vec<String>, Vec<String>, Vec<String>) {
        let (_, columns) = app.board(owner, "Board").await;
        let mut todo = Vec::new();
        for title in ["a", "b", "c"] {
            todo.push(app.card(owner, &columns[0], title).await);
        }
        let mut doing = Vec::new();
        for title in ["x", "y"] {
            doing.push(app.card(owner, &columns[1], title).await);
        }
        (columns, todo, doing)
    }

    #[tokio::test]
    async fn cards_append_in_order() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let (columns, todo, _) = seeded(&app, &owner).await;

        let id = columns[0].parse().unwrap();
        let positions: Vec<i32> = app
            .store
            .cards(id)
            .await
            .unwrap()
            .iter()
            .map(|c| c.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(todo.len(), 3);
    }

    #[tokio::test]
    async fn create_requires_column_and_title() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;

        let (status, body) = app.post("/api/cards", &owner, json!({ "title": "x" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Column ID and title are required");
    }

    #[tokio::test]
    async fn cross_column_move_renumbers_both_columns() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let (columns, todo, doing) = seeded(&app, &owner).await;

        let (status, body) = app
            .post(
                "/api/cards/move",
                &owner,
                json!({
                    "card_id": todo[0],
                    "source_column_id": columns[0],
                    "destination_column_id": columns[1],
                    "new_position": 1,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        assert_eq!(body["card"]["column_id"], columns[1].as_str());
        assert_eq!(body["card"]["position"], 1);
        assert_eq!(
            ids_and_positions(&body["destination"]),
            vec![
                (doing[0].clone(), 0),
                (todo[0].clone(), 1),
                (doing[1].clone(), 2)
            ]
        );
        assert_eq!(
            ids_and_positions(&body["source"]),
            vec![(todo[1].clone(), 0), (todo[2].clone(), 1)]
        );

        let board = app
            .store
            .column(columns[0].parse().unwrap())
            .await
            .unwrap()
            .unwrap()
            .board_id;
        let activity = app.store.activity(board, 1).await.unwrap();
        assert_eq!(activity[0].log.action.as_str(), "moved");
        assert_eq!(activity[0].log.metadata["from_column"], "To Do");
        assert_eq!(activity[0].log.metadata["to_column"], "In Progress");
    }

    #[tokio::test]
    async fn same_column_reorder_logs_nothing() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let (columns, todo, _) = seeded(&app, &owner).await;
        let board = app
            .store
            .column(columns[0].parse().unwrap())
            .await
            .unwrap()
            .unwrap()
            .board_id;
        let before = app.store.activity(board, 200).await.unwrap().len();

        let (status, body) = app
            .post(
                "/api/cards/move",
                &owner,
                json!({
                    "card_id": todo[2],
                    "source_column_id": columns[0],
                    "destination_column_id": columns[0],
                    "new_position": 0,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            ids_and_positions(&body["destination"]),
            vec![
                (todo[2].clone(), 0),
                (todo[0].clone(), 1),
                (todo[1].clone(), 2)
            ]
        );
        assert!(body["source"].as_array().unwrap().is_empty());
        assert_eq!(app.store.activity(board, 200).await.unwrap().len(), before);
    }

    #[tokio::test]
    async fn move_validates_request() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let (columns, todo, _) = seeded(&app, &owner).await;

        let (status, body) = app
            .post("/api/cards/move", &owner, json!({ "card_id": todo[0] }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields");

        let (status, _) = app
            .post(
                "/api/cards/move",
                &owner,
                json!({
                    "card_id": todo[0],
                    "source_column_id": columns[1],
                    "destination_column_id": columns[2],
                    "new_position": 0,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .post(
                "/api/cards/move",
                &owner,
                json!({
                    "card_id": todo[0],
                    "source_column_id": columns[0],
                    "destination_column_id": columns[1],
                    "new_position": -1,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_members_cannot_touch_cards() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let mallory = app.user("mallory@example.com").await;
        let (columns, todo, _) = seeded(&app, &owner).await;

        let (status, _) = app
            .post("/api/cards", &mallory, json!({ "column_id": columns[0], "title": "spam" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .patch("/api/cards", &mallory, json!({ "id": todo[0], "title": "spam" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .delete(&format!("/api/cards?id={}", todo[0]), &mallory)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .post(
                "/api/cards/move",
                &mallory,
                json!({
                    "card_id": todo[0],
                    "source_column_id": columns[0],
                    "destination_column_id": columns[1],
                    "new_position": 0,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn patch_sets_and_clears_assignee() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let (columns, todo, _) = seeded(&app, &owner).await;
        let owner_id = owner.profile.id.to_string();

        let (status, card) = app
            .patch(
                "/api/cards",
                &owner,
                json!({ "id": todo[0], "assignee_id": owner_id, "description": "notes" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{card}");
        assert_eq!(card["assignee_id"], owner_id.as_str());
        assert_eq!(card["assignee"]["email"], "owner@example.com");
        assert_eq!(card["description"], "notes");

        let (_, card) = app
            .patch("/api/cards", &owner, json!({ "id": todo[0], "assignee_id": null }))
            .await;
        assert!(card["assignee_id"].is_null());
        assert_eq!(card["description"], "notes");

        let board = app
            .store
            .column(columns[0].parse().unwrap())
            .await
            .unwrap()
            .unwrap()
            .board_id;
        let actions: Vec<&str> = app
            .store
            .activity(board, 10)
            .await
            .unwrap()
            .iter()
            .map(|a| a.log.action.as_str())
            .collect();
        assert_eq!(&actions[..4], ["unassigned", "updated", "assigned", "updated"]);
    }

    #[tokio::test]
    async fn unknown_assignee_is_not_found() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let (columns, todo, _) = seeded(&app, &owner).await;
        let stranger = uuid::Uuid::new_v4();

        let (status, body) = app
            .post(
                "/api/cards",
                &owner,
                json!({ "column_id": columns[0], "title": "t", "assignee_id": stranger }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Assignee not found");
        assert_eq!(app.store.cards(columns[0].parse().unwrap()).await.unwrap().len(), 3);

        let (status, body) = app
            .patch("/api/cards", &owner, json!({ "id": todo[0], "assignee_id": stranger }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Assignee not found");

        let card = app.store.card(todo[0].parse().unwrap()).await.unwrap().unwrap();
        assert!(card.assignee_id.is_none());
    }

    #[tokio::test]
    async fn delete_card() {
        let app = TestApp::new();
        let owner = app.user("owner@example.com").await;
        let (_, todo, _) = seeded(&app, &owner).await;

        let (status, body) = app
            .delete(&format!("/api/cards?id={}", todo[1]), &owner)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Card deleted successfully");

        let (status, _) = app
            .delete(&format!("/api/cards?id={}", todo[1]), &owner)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
