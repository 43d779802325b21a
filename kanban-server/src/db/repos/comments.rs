//! Comment repository

use sqlx::postgres::PgRow;
use sqlx::PgPool;
use uuid::Uuid;

use kanban_core::{Comment, CommentWithAuthor, NewComment};

use super::{comment_from_row, summary_from_row};
use crate::store::DbError;

fn with_author(row: &PgRow) -> CommentWithAuthor {
    CommentWithAuthor {
        comment: comment_from_row(row),
        user: summary_from_row(row, "u"),
    }
}

pub struct CommentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Comments on a card with authors, oldest first.
    pub async fn list(&self, card_id: Uuid) -> Result<Vec<CommentWithAuthor>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                c.id, c.card_id, c.user_id, c.content, c.created_at, c.updated_at,
                u.id AS u_id, u.email AS u_email, u.full_name AS u_full_name,
                u.avatar_url AS u_avatar_url
            FROM comments c
            LEFT JOIN profiles u ON u.id = c.user_id
            WHERE c.card_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(card_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.iter().map(with_author).collect())
    }

    pub async fn get(&self, comment_id: Uuid) -> Result<Option<Comment>, DbError> {
        let row = sqlx::query(
            "SELECT id, card_id, user_id, content, created_at, updated_at FROM comments WHERE id = $1",
        )
        .bind(comment_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.as_ref().map(comment_from_row))
    }

    pub async fn create(&self, new: NewComment) -> Result<CommentWithAuthor, DbError> {
        let row = sqlx::query(
            r#"
            WITH inserted AS (
                INSERT INTO comments (card_id, user_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, card_id, user_id, content, created_at, updated_at
            )
            SELECT
                c.id, c.card_id, c.user_id, c.content, c.created_at, c.updated_at,
                u.id AS u_id, u.email AS u_email, u.full_name AS u_full_name,
                u.avatar_url AS u_avatar_url
            FROM inserted c
            LEFT JOIN profiles u ON u.id = c.user_id
            "#,
        )
        .bind(new.card_id)
        .bind(new.user_id)
        .bind(&new.content)
        .fetch_one(self.pool)
        .await
        .map_err(|e| super::missing_parent(e, "card", new.card_id))?;

        Ok(with_author(&row))
    }

    pub async fn update(&self, comment_id: Uuid, content: &str) -> Result<CommentWithAuthor, DbError> {
        let row = sqlx::query(
            r#"
            WITH updated AS (
                UPDATE comments SET content = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING id, card_id, user_id, content, created_at, updated_at
            )
            SELECT
                c.id, c.card_id, c.user_id, c.content, c.created_at, c.updated_at,
                u.id AS u_id, u.email AS u_email, u.full_name AS u_full_name,
                u.avatar_url AS u_avatar_url
            FROM updated c
            LEFT JOIN profiles u ON u.id = c.user_id
            "#,
        )
        .bind(comment_id)
        .bind(content)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("comment", comment_id))?;

        Ok(with_author(&row))
    }

    pub async fn delete(&self, comment_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("comment", comment_id));
        }
        Ok(())
    }
}
