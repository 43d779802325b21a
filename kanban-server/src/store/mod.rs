//! Storage seam for the HTTP layer
//!
//! Handlers only talk to [`KanbanStore`]. Two implementations exist:
//! - [`crate::db::PgStore`]: PostgreSQL through sqlx repositories
//! - [`MemoryStore`]: process-local maps, used by tests and `serve --memory`
//!
//! Both keep the same contract: list methods return rows in display order,
//! deletes cascade (board → columns/members/activity, column → cards,
//! card → comments) and missing rows on update/delete are `DbError::NotFound`.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use kanban_core::{
    ActivityEntry, ActivityLog, Board, BoardChanges, BoardDetails, BoardMember, BoardSummary, Card,
    CardChanges, CardWithAssignee, Column, ColumnChanges, Comment, CommentWithAuthor, Email,
    MemberWithProfile, NewActivity, NewBoard, NewCard, NewColumn, NewComment, PositionWrite,
    Profile, Role,
};

pub use memory::MemoryStore;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("invalid stored value: {0}")]
    Decode(String),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

#[async_trait]
pub trait KanbanStore: Send + Sync + 'static {
    /// Cheap liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), DbError>;

    // Profiles and sessions

    async fn create_profile(
        &self,
        email: &Email,
        full_name: Option<&str>,
    ) -> Result<Profile, DbError>;

    async fn profile_by_email(&self, email: &Email) -> Result<Option<Profile>, DbError>;

    async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), DbError>;

    /// Profile behind a bearer token, if the token exists and has not expired.
    async fn resolve_session(&self, token: &str) -> Result<Option<Profile>, DbError>;

    // Boards

    /// Boards the user is a member of, newest first.
    async fn boards_for_user(&self, user_id: Uuid) -> Result<Vec<BoardSummary>, DbError>;

    /// Insert the board, its owner membership and the default columns.
    async fn create_board(&self, board: NewBoard) -> Result<Board, DbError>;

    async fn board(&self, board_id: Uuid) -> Result<Option<Board>, DbError>;

    async fn board_details(&self, board_id: Uuid) -> Result<Option<BoardDetails>, DbError>;

    async fn update_board(&self, board_id: Uuid, changes: &BoardChanges)
        -> Result<Board, DbError>;

    async fn delete_board(&self, board_id: Uuid) -> Result<(), DbError>;

    // Members

    async fn membership(
        &self,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BoardMember>, DbError>;

    async fn members(&self, board_id: Uuid) -> Result<Vec<MemberWithProfile>, DbError>;

    async fn member(&self, member_id: Uuid) -> Result<Option<BoardMember>, DbError>;

    /// Fails with `Conflict` when the user is already on the board.
    async fn add_member(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<MemberWithProfile, DbError>;

    async fn set_member_role(&self, member_id: Uuid, role: Role) -> Result<BoardMember, DbError>;

    async fn remove_member(&self, member_id: Uuid) -> Result<(), DbError>;

    // Columns

    async fn column(&self, column_id: Uuid) -> Result<Option<Column>, DbError>;

    /// Columns of a board in display order.
    async fn columns(&self, board_id: Uuid) -> Result<Vec<Column>, DbError>;

    async fn create_column(&self, column: NewColumn) -> Result<Column, DbError>;

    async fn update_column(
        &self,
        column_id: Uuid,
        changes: &ColumnChanges,
    ) -> Result<Column, DbError>;

    async fn delete_column(&self, column_id: Uuid) -> Result<(), DbError>;

    // Cards

    async fn card(&self, card_id: Uuid) -> Result<Option<Card>, DbError>;

    /// Cards of a column in display order.
    async fn cards(&self, column_id: Uuid) -> Result<Vec<Card>, DbError>;

    async fn create_card(&self, card: NewCard) -> Result<CardWithAssignee, DbError>;

    async fn update_card(
        &self,
        card_id: Uuid,
        changes: &CardChanges,
    ) -> Result<CardWithAssignee, DbError>;

    async fn delete_card(&self, card_id: Uuid) -> Result<(), DbError>;

    /// Apply a reorder plan's writes, all or nothing.
    async fn apply_positions(&self, writes: &[PositionWrite]) -> Result<(), DbError>;

    // Comments

    /// Comments on a card, oldest first.
    async fn comments(&self, card_id: Uuid) -> Result<Vec<CommentWithAuthor>, DbError>;

    async fn comment(&self, comment_id: Uuid) -> Result<Option<Comment>, DbError>;

    async fn create_comment(&self, comment: NewComment) -> Result<CommentWithAuthor, DbError>;

    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, DbError>;

    async fn delete_comment(&self, comment_id: Uuid) -> Result<(), DbError>;

    // Activity

    async fn record_activity(&self, activity: NewActivity) -> Result<ActivityLog, DbError>;

    /// Newest first, at most `limit` entries.
    async fn activity(&self, board_id: Uuid, limit: i64) -> Result<Vec<ActivityEntry>, DbError>;
}
