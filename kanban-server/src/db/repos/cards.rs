//! Card repository
//!
//! Every read returns the assignee's profile via LEFT JOIN. Inserts and
//! updates use a CTE so the joined row comes back in one round trip.

use sqlx::postgres::PgRow;
use sqlx::PgPool;
use uuid::Uuid;

use kanban_core::{Card, CardChanges, CardWithAssignee, NewCard};

use super::{card_from_row, summary_from_row};
use crate::store::DbError;

const ASSIGNEE_FK: &str = "cards_assignee_id_fkey";

fn with_assignee(row: &PgRow) -> CardWithAssignee {
    CardWithAssignee {
        card: card_from_row(row),
        assignee: summary_from_row(row, "a"),
    }
}

/// Map a foreign-key violation on `cards` to whichever parent is missing.
fn missing_parent(err: sqlx::Error, column_id: Option<Uuid>, assignee_id: Option<Uuid>) -> DbError {
    let constraint = match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            db.constraint().map(str::to_owned)
        }
        _ => return DbError::Sqlx(err),
    };

    match (constraint.as_deref(), column_id, assignee_id) {
        (Some(ASSIGNEE_FK), _, Some(id)) => DbError::not_found("assignee", id),
        (_, Some(id), _) => DbError::not_found("column", id),
        _ => DbError::Sqlx(err),
    }
}

pub struct CardRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CardRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, card_id: Uuid) -> Result<Option<Card>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, column_id, title, description, position, assignee_id, due_date,
                   created_at, updated_at
            FROM cards
            WHERE id = $1
            "#,
        )
        .bind(card_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.as_ref().map(card_from_row))
    }

    /// Cards of a column in display order.
    pub async fn list(&self, column_id: Uuid) -> Result<Vec<Card>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, column_id, title, description, position, assignee_id, due_date,
                   created_at, updated_at
            FROM cards
            WHERE column_id = $1
            ORDER BY position ASC, created_at ASC, id ASC
            "#,
        )
        .bind(column_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.iter().map(card_from_row).collect())
    }

    /// All cards on a board with assignees, each column's cards in display order.
    pub async fn list_for_board(&self, board_id: Uuid) -> Result<Vec<CardWithAssignee>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                c.id, c.column_id, c.title, c.description, c.position, c.assignee_id,
                c.due_date, c.created_at, c.updated_at,
                a.id AS a_id, a.email AS a_email, a.full_name AS a_full_name,
                a.avatar_url AS a_avatar_url
            FROM cards c
            JOIN board_columns col ON col.id = c.column_id
            LEFT JOIN profiles a ON a.id = c.assignee_id
            WHERE col.board_id = $1
            ORDER BY c.column_id, c.position ASC, c.created_at ASC, c.id ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.iter().map(with_assignee).collect())
    }

    /// Insert a card; without a position it goes after the last card.
    pub async fn create(&self, new: NewCard) -> Result<CardWithAssignee, DbError> {
        let row = sqlx::query(
            r#"
            WITH inserted AS (
                INSERT INTO cards (column_id, title, description, assignee_id, due_date, position)
                VALUES (
                    $1, $2, $3, $4, $5,
                    COALESCE(
                        $6,
                        (SELECT COALESCE(MAX(position) + 1, 0) FROM cards WHERE column_id = $1)
                    )
                )
                RETURNING *
            )
            SELECT
                c.id, c.column_id, c.title, c.description, c.position, c.assignee_id,
                c.due_date, c.created_at, c.updated_at,
                a.id AS a_id, a.email AS a_email, a.full_name AS a_full_name,
                a.avatar_url AS a_avatar_url
            FROM inserted c
            LEFT JOIN profiles a ON a.id = c.assignee_id
            "#,
        )
        .bind(new.column_id)
        .bind(new.title.as_str())
        .bind(new.description.as_deref())
        .bind(new.assignee_id)
        .bind(new.due_date)
        .bind(new.position)
        .fetch_one(self.pool)
        .await
        .map_err(|e| missing_parent(e, Some(new.column_id), new.assignee_id))?;

        Ok(with_assignee(&row))
    }

    /// Apply a partial update. Nullable fields use a `set` flag so `Some(None)`
    /// clears the column while `None` leaves it alone.
    pub async fn update(
        &self,
        card_id: Uuid,
        changes: &CardChanges,
    ) -> Result<CardWithAssignee, DbError> {
        let row = sqlx::query(
            r#"
            WITH updated AS (
                UPDATE cards SET
                    column_id = COALESCE($2, column_id),
                    title = COALESCE($3, title),
                    description = CASE WHEN $4 THEN $5 ELSE description END,
                    assignee_id = CASE WHEN $6 THEN $7 ELSE assignee_id END,
                    due_date = CASE WHEN $8 THEN $9 ELSE due_date END,
                    position = COALESCE($10, position),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT
                c.id, c.column_id, c.title, c.description, c.position, c.assignee_id,
                c.due_date, c.created_at, c.updated_at,
                a.id AS a_id, a.email AS a_email, a.full_name AS a_full_name,
                a.avatar_url AS a_avatar_url
            FROM updated c
            LEFT JOIN profiles a ON a.id = c.assignee_id
            "#,
        )
        .bind(card_id)
        .bind(changes.column_id)
        .bind(changes.title.as_deref())
        .bind(changes.description.is_some())
        .bind(changes.description.clone().flatten())
        .bind(changes.assignee_id.is_some())
        .bind(changes.assignee_id.flatten())
        .bind(changes.due_date.is_some())
        .bind(changes.due_date.flatten())
        .bind(changes.position)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| missing_parent(e, changes.column_id, changes.assignee_id.flatten()))?
        .ok_or_else(|| DbError::not_found("card", card_id))?;

        Ok(with_assignee(&row))
    }

    /// Delete a card; its comments go with it.
    pub async fn delete(&self, card_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(card_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("card", card_id));
        }
        Ok(())
    }
}
