//! PostgreSQL-backed [`KanbanStore`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use kanban_core::{
    ActivityEntry, ActivityLog, Board, BoardChanges, BoardDetails, BoardMember, BoardSummary, Card,
    CardChanges, CardWithAssignee, Column, ColumnChanges, Comment, CommentWithAuthor, Email,
    MemberWithProfile, NewActivity, NewBoard, NewCard, NewColumn, NewComment, PositionWrite,
    Profile, Role,
};

use super::repos::{
    ActivityRepo, BoardRepo, CardRepo, ColumnRepo, CommentRepo, MemberRepo, PositionRepo,
    ProfileRepo,
};
use crate::store::{DbError, KanbanStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl KanbanStore for PgStore {
    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_profile(
        &self,
        email: &Email,
        full_name: Option<&str>,
    ) -> Result<Profile, DbError> {
        ProfileRepo::new(&self.pool).create(email, full_name).await
    }

    async fn profile_by_email(&self, email: &Email) -> Result<Option<Profile>, DbError> {
        ProfileRepo::new(&self.pool).by_email(email).await
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), DbError> {
        ProfileRepo::new(&self.pool)
            .create_session(user_id, token, expires_at)
            .await
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<Profile>, DbError> {
        ProfileRepo::new(&self.pool).by_session(token).await
    }

    async fn boards_for_user(&self, user_id: Uuid) -> Result<Vec<BoardSummary>, DbError> {
        BoardRepo::new(&self.pool).list_for_user(user_id).await
    }

    async fn create_board(&self, board: NewBoard) -> Result<Board, DbError> {
        BoardRepo::new(&self.pool).create(board).await
    }

    async fn board(&self, board_id: Uuid) -> Result<Option<Board>, DbError> {
        BoardRepo::new(&self.pool).get(board_id).await
    }

    async fn board_details(&self, board_id: Uuid) -> Result<Option<BoardDetails>, DbError> {
        BoardRepo::new(&self.pool).details(board_id).await
    }

    async fn update_board(
        &self,
        board_id: Uuid,
        changes: &BoardChanges,
    ) -> Result<Board, DbError> {
        BoardRepo::new(&self.pool).update(board_id, changes).await
    }

    async fn delete_board(&self, board_id: Uuid) -> Result<(), DbError> {
        BoardRepo::new(&self.pool).delete(board_id).await
    }

    async fn membership(
        &self,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BoardMember>, DbError> {
        MemberRepo::new(&self.pool).for_user(board_id, user_id).await
    }

    async fn members(&self, board_id: Uuid) -> Result<Vec<MemberWithProfile>, DbError> {
        MemberRepo::new(&self.pool).list(board_id).await
    }

    async fn member(&self, member_id: Uuid) -> Result<Option<BoardMember>, DbError> {
        MemberRepo::new(&self.pool).get(member_id).await
    }

    async fn add_member(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<MemberWithProfile, DbError> {
        MemberRepo::new(&self.pool).add(board_id, user_id, role).await
    }

    async fn set_member_role(&self, member_id: Uuid, role: Role) -> Result<BoardMember, DbError> {
        MemberRepo::new(&self.pool).set_role(member_id, role).await
    }

    async fn remove_member(&self, member_id: Uuid) -> Result<(), DbError> {
        MemberRepo::new(&self.pool).remove(member_id).await
    }

    async fn column(&self, column_id: Uuid) -> Result<Option<Column>, DbError> {
        ColumnRepo::new(&self.pool).get(column_id).await
    }

    async fn columns(&self, board_id: Uuid) -> Result<Vec<Column>, DbError> {
        ColumnRepo::new(&self.pool).list(board_id).await
    }

    async fn create_column(&self, column: NewColumn) -> Result<Column, DbError> {
        ColumnRepo::new(&self.pool).create(column).await
    }

    async fn update_column(
        &self,
        column_id: Uuid,
        changes: &ColumnChanges,
    ) -> Result<Column, DbError> {
        ColumnRepo::new(&self.pool).update(column_id, changes).await
    }

    async fn delete_column(&self, column_id: Uuid) -> Result<(), DbError> {
        ColumnRepo::new(&self.pool).delete(column_id).await
    }

    async fn card(&self, card_id: Uuid) -> Result<Option<Card>, DbError> {
        CardRepo::new(&self.pool).get(card_id).await
    }

    async fn cards(&self, column_id: Uuid) -> Result<Vec<Card>, DbError> {
        CardRepo::new(&self.pool).list(column_id).await
    }

    async fn create_card(&self, card: NewCard) -> Result<CardWithAssignee, DbError> {
        CardRepo::new(&self.pool).create(card).await
    }

    async fn update_card(
        &self,
        card_id: Uuid,
        changes: &CardChanges,
    ) -> Result<CardWithAssignee, DbError> {
        CardRepo::new(&self.pool).update(card_id, changes).await
    }

    async fn delete_card(&self, card_id: Uuid) -> Result<(), DbError> {
        CardRepo::new(&self.pool).delete(card_id).await
    }

    async fn apply_positions(&self, writes: &[PositionWrite]) -> Result<(), DbError> {
        PositionRepo::new(&self.pool).apply(writes).await
    }

    async fn comments(&self, card_id: Uuid) -> Result<Vec<CommentWithAuthor>, DbError> {
        CommentRepo::new(&self.pool).list(card_id).await
    }

    async fn comment(&self, comment_id: Uuid) -> Result<Option<Comment>, DbError> {
        CommentRepo::new(&self.pool).get(comment_id).await
    }

    async fn create_comment(&self, comment: NewComment) -> Result<CommentWithAuthor, DbError> {
        CommentRepo::new(&self.pool).create(comment).await
    }

    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, DbError> {
        CommentRepo::new(&self.pool).update(comment_id, content).await
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<(), DbError> {
        CommentRepo::new(&self.pool).delete(comment_id).await
    }

    async fn record_activity(&self, activity: NewActivity) -> Result<ActivityLog, DbError> {
        ActivityRepo::new(&self.pool).record(activity).await
    }

    async fn activity(&self, board_id: Uuid, limit: i64) -> Result<Vec<ActivityEntry>, DbError> {
        ActivityRepo::new(&self.pool).list(board_id, limit).await
    }
}
