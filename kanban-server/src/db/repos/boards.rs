//! Board repository
//!
//! - create: board, owner membership and default columns in one transaction
//! - list: JOIN on membership with owner and member count (no N+1)
//! - details: four queries regardless of board size

use std::collections::HashMap;

use sqlx::{PgPool, Row};
use uuid::Uuid;

use kanban_core::{
    Board, BoardChanges, BoardDetails, BoardSummary, CardWithAssignee, ColumnWithCards, NewBoard,
    Role, DEFAULT_COLUMNS,
};

use super::{board_from_row, summary_from_row, CardRepo, ColumnRepo, MemberRepo};
use crate::store::DbError;

/// Board repository
pub struct BoardRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> BoardRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Boards the user belongs to, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<BoardSummary>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                b.id, b.title, b.description, b.owner_id, b.created_at, b.updated_at,
                o.id AS o_id, o.email AS o_email, o.full_name AS o_full_name,
                o.avatar_url AS o_avatar_url,
                (SELECT COUNT(*) FROM board_members m WHERE m.board_id = b.id) AS member_count
            FROM boards b
            JOIN board_members bm ON bm.board_id = b.id AND bm.user_id = $1
            LEFT JOIN profiles o ON o.id = b.owner_id
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| BoardSummary {
                board: board_from_row(r),
                owner: summary_from_row(r, "o"),
                member_count: r.get("member_count"),
            })
            .collect())
    }

    /// Create a board with its owner membership and default columns.
    pub async fn create(&self, new: NewBoard) -> Result<Board, DbError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO boards (title, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, owner_id, created_at, updated_at
            "#,
        )
        .bind(new.title.as_str())
        .bind(new.description.as_deref())
        .bind(new.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| super::missing_parent(e, "profile", new.owner_id))?;
        let board = board_from_row(&row);

        sqlx::query("INSERT INTO board_members (board_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(board.id)
            .bind(new.owner_id)
            .bind(Role::Owner.as_str())
            .execute(&mut *tx)
            .await?;

        for (position, title) in DEFAULT_COLUMNS.iter().enumerate() {
            sqlx::query("INSERT INTO board_columns (board_id, title, position) VALUES ($1, $2, $3)")
                .bind(board.id)
                .bind(*title)
                .bind(position as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(board)
    }

    pub async fn get(&self, board_id: Uuid) -> Result<Option<Board>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, owner_id, created_at, updated_at
            FROM boards
            WHERE id = $1
            "#,
        )
        .bind(board_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.as_ref().map(board_from_row))
    }

    /// Board with owner, columns (each with cards) and members.
    pub async fn details(&self, board_id: Uuid) -> Result<Option<BoardDetails>, DbError> {
        let Some(row) = sqlx::query(
            r#"
            SELECT
                b.id, b.title, b.description, b.owner_id, b.created_at, b.updated_at,
                o.id AS o_id, o.email AS o_email, o.full_name AS o_full_name,
                o.avatar_url AS o_avatar_url
            FROM boards b
            LEFT JOIN profiles o ON o.id = b.owner_id
            WHERE b.id = $1
            "#,
        )
        .bind(board_id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let columns = ColumnRepo::new(self.pool).list(board_id).await?;
        // rows arrive in display order, so pushing keeps each column sorted
        let mut cards_by_column: HashMap<Uuid, Vec<CardWithAssignee>> = HashMap::new();
        for card in CardRepo::new(self.pool).list_for_board(board_id).await? {
            cards_by_column
                .entry(card.card.column_id)
                .or_default()
                .push(card);
        }

        let columns = columns
            .into_iter()
            .map(|column| {
                let cards = cards_by_column.remove(&column.id).unwrap_or_default();
                ColumnWithCards { column, cards }
            })
            .collect();

        let members = MemberRepo::new(self.pool).list(board_id).await?;

        Ok(Some(BoardDetails {
            board: board_from_row(&row),
            owner: summary_from_row(&row, "o"),
            columns,
            members,
        }))
    }

    pub async fn update(&self, board_id: Uuid, changes: &BoardChanges) -> Result<Board, DbError> {
        let row = sqlx::query(
            r#"
            UPDATE boards SET
                title = COALESCE($2, title),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, owner_id, created_at, updated_at
            "#,
        )
        .bind(board_id)
        .bind(changes.title.as_deref())
        .bind(changes.description.is_some())
        .bind(changes.description.clone().flatten())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("board", board_id))?;

        Ok(board_from_row(&row))
    }

    pub async fn delete(&self, board_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(board_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("board", board_id));
        }
        Ok(())
    }
}
