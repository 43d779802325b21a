//! Applies reorder plans
//!
//! All writes of one plan run in a single transaction. A write that matches
//! no row aborts the whole plan.

use sqlx::PgPool;

use kanban_core::PositionWrite;

use crate::store::DbError;

pub struct PositionRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PositionRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn apply(&self, writes: &[PositionWrite]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        for write in writes {
            match *write {
                PositionWrite::Card {
                    card_id,
                    column_id,
                    position,
                } => {
                    let result = sqlx::query(
                        r#"
                        UPDATE cards
                        SET column_id = $2, position = $3, updated_at = NOW()
                        WHERE id = $1
                        "#,
                    )
                    .bind(card_id)
                    .bind(column_id)
                    .bind(position)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| super::missing_parent(e, "column", column_id))?;

                    if result.rows_affected() == 0 {
                        return Err(DbError::not_found("card", card_id));
                    }
                }
                PositionWrite::Column {
                    column_id,
                    position,
                } => {
                    let result =
                        sqlx::query("UPDATE board_columns SET position = $2 WHERE id = $1")
                            .bind(column_id)
                            .bind(position)
                            .execute(&mut *tx)
                            .await?;

                    if result.rows_affected() == 0 {
                        return Err(DbError::not_found("column", column_id));
                    }
                }
            }
        }

        tx.commit().await?;
        tracing::debug!(writes = writes.len(), "applied position writes");
        Ok(())
    }
}
