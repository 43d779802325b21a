//! Activity log repository (append-only)

use sqlx::PgPool;
use uuid::Uuid;

use kanban_core::{ActivityEntry, ActivityLog, NewActivity};

use super::{activity_from_row, summary_from_row};
use crate::store::DbError;

pub struct ActivityRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ActivityRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, new: NewActivity) -> Result<ActivityLog, DbError> {
        let row = sqlx::query(
            r#"
            INSERT INTO activity_logs (board_id, user_id, action, entity_type, entity_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, board_id, user_id, action, entity_type, entity_id, metadata, created_at
            "#,
        )
        .bind(new.board_id)
        .bind(new.user_id)
        .bind(new.action.as_str())
        .bind(new.entity_type.as_str())
        .bind(new.entity_id)
        .bind(&new.metadata)
        .fetch_one(self.pool)
        .await
        .map_err(|e| super::missing_parent(e, "board", new.board_id))?;

        activity_from_row(&row)
    }

    /// Newest first, at most `limit` rows.
    pub async fn list(&self, board_id: Uuid, limit: i64) -> Result<Vec<ActivityEntry>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                l.id, l.board_id, l.user_id, l.action, l.entity_type, l.entity_id,
                l.metadata, l.created_at,
                u.id AS u_id, u.email AS u_email, u.full_name AS u_full_name,
                u.avatar_url AS u_avatar_url
            FROM activity_logs l
            LEFT JOIN profiles u ON u.id = l.user_id
            WHERE l.board_id = $1
            ORDER BY l.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(board_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(ActivityEntry {
                    log: activity_from_row(r)?,
                    user: summary_from_row(r, "u"),
                })
            })
            .collect()
    }
}
