//! Column repository

use sqlx::PgPool;
use uuid::Uuid;

use kanban_core::{Column, ColumnChanges, NewColumn};

use super::column_from_row;
use crate::store::DbError;

pub struct ColumnRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ColumnRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, column_id: Uuid) -> Result<Option<Column>, DbError> {
        let row = sqlx::query(
            "SELECT id, board_id, title, position, created_at FROM board_columns WHERE id = $1",
        )
        .bind(column_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.as_ref().map(column_from_row))
    }

    /// Columns of a board in display order.
    pub async fn list(&self, board_id: Uuid) -> Result<Vec<Column>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, board_id, title, position, created_at
            FROM board_columns
            WHERE board_id = $1
            ORDER BY position ASC, created_at ASC, id ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.iter().map(column_from_row).collect())
    }

    /// Insert a column; without a position it goes after the last one.
    pub async fn create(&self, new: NewColumn) -> Result<Column, DbError> {
        let row = sqlx::query(
            r#"
            INSERT INTO board_columns (board_id, title, position)
            VALUES (
                $1,
                $2,
                COALESCE(
                    $3,
                    (SELECT COALESCE(MAX(position) + 1, 0) FROM board_columns WHERE board_id = $1)
                )
            )
            RETURNING id, board_id, title, position, created_at
            "#,
        )
        .bind(new.board_id)
        .bind(new.title.as_str())
        .bind(new.position)
        .fetch_one(self.pool)
        .await
        .map_err(|e| super::missing_parent(e, "board", new.board_id))?;

        Ok(column_from_row(&row))
    }

    pub async fn update(&self, column_id: Uuid, changes: &ColumnChanges) -> Result<Column, DbError> {
        let row = sqlx::query(
            r#"
            UPDATE board_columns SET
                title = COALESCE($2, title),
                position = COALESCE($3, position)
            WHERE id = $1
            RETURNING id, board_id, title, position, created_at
            "#,
        )
        .bind(column_id)
        .bind(changes.title.as_deref())
        .bind(changes.position)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("column", column_id))?;

        Ok(column_from_row(&row))
    }

    /// Delete a column; its cards go with it (`ON DELETE CASCADE`).
    pub async fn delete(&self, column_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM board_columns WHERE id = $1")
            .bind(column_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("column", column_id));
        }
        Ok(())
    }
}
