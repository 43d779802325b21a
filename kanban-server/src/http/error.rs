//! API error types with IntoResponse
//!
//! Every error becomes `{"error": message}` with the matching status code.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use kanban_core::{MoveError, ValidationError};

use crate::reorder::ReorderError;
use crate::store::DbError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Malformed or conflicting request (400)
    BadRequest(String),

    /// Missing or unknown bearer token (401)
    Unauthorized,

    /// Caller lacks the role for this board (403)
    Forbidden { reason: &'static str },

    /// Resource not found (404); carries the caller-facing message
    NotFound(String),

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn access_denied() -> Self {
        Self::Forbidden {
            reason: "Access denied",
        }
    }

    /// `404 "<Resource> not found"`
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{} not found", capitalize(resource)))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::BadRequest(message) => message.clone(),
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::Forbidden { reason } => (*reason).to_string(),
            Self::NotFound(message) => message.clone(),
            Self::Database(e) => e.to_string(),
            Self::Internal { message } => message.clone(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        match &self {
            Self::Database(e) => tracing::error!("Database error: {}", e),
            Self::Internal { message } => tracing::error!("Internal error: {}", message),
            _ => tracing::debug!(status = status.as_u16(), error = %message, "request rejected"),
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, .. } => Self::not_found(resource),
            DbError::Conflict(message) => Self::BadRequest(message),
            _ => Self::Database(e),
        }
    }
}

impl From<MoveError> for ApiError {
    fn from(e: MoveError) -> Self {
        match e {
            MoveError::CardNotInColumn { .. } => {
                Self::BadRequest("card is not in the source column".into())
            }
            MoveError::ColumnNotOnBoard { .. } => Self::not_found("column"),
            MoveError::CrossBoard => Self::BadRequest(e.to_string()),
        }
    }
}

impl From<ReorderError> for ApiError {
    fn from(e: ReorderError) -> Self {
        match e {
            ReorderError::Db(e) => e.into(),
            ReorderError::Move(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(%rejection, "invalid JSON body");
        Self::BadRequest("Invalid request body".into())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(%rejection, "invalid query string");
        Self::BadRequest("Invalid query string".into())
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        Self::Validation(ValidationError::InvalidFormat {
            field: "id",
            reason: "invalid UUID format",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let (status, body) = body_of(ApiError::Validation(ValidationError::Required {
            message: "Board ID and title are required",
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Board ID and title are required");
    }

    #[tokio::test]
    async fn not_found_is_404_with_resource_name() {
        let (status, body) = body_of(DbError::not_found("card", "x").into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Card not found");
    }

    #[tokio::test]
    async fn forbidden_is_403() {
        let (status, body) = body_of(ApiError::access_denied()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Access denied");
    }

    #[tokio::test]
    async fn unauthorized_is_401() {
        let (status, body) = body_of(ApiError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn duplicate_member_conflict_is_400() {
        let err: ApiError =
            DbError::Conflict("User is already a member of this board".into()).into();
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "User is already a member of this board");
    }

    #[test]
    fn move_errors_map_to_client_errors() {
        let err: ApiError = MoveError::CrossBoard.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = MoveError::ColumnNotOnBoard {
            column_id: uuid::Uuid::nil(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
