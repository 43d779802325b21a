//! Board membership repository

use sqlx::PgPool;
use uuid::Uuid;

use kanban_core::{BoardMember, MemberWithProfile, Role};

use super::{member_from_row, summary_from_row};
use crate::store::DbError;

pub struct MemberRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> MemberRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn for_user(
        &self,
        board_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BoardMember>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, board_id, user_id, role, joined_at
            FROM board_members
            WHERE board_id = $1 AND user_id = $2
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.as_ref().map(member_from_row).transpose()
    }

    pub async fn get(&self, member_id: Uuid) -> Result<Option<BoardMember>, DbError> {
        let row = sqlx::query(
            "SELECT id, board_id, user_id, role, joined_at FROM board_members WHERE id = $1",
        )
        .bind(member_id)
        .fetch_optional(self.pool)
        .await?;

        row.as_ref().map(member_from_row).transpose()
    }

    /// Members with their profiles, in join order.
    pub async fn list(&self, board_id: Uuid) -> Result<Vec<MemberWithProfile>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                m.id, m.board_id, m.user_id, m.role, m.joined_at,
                u.id AS u_id, u.email AS u_email, u.full_name AS u_full_name,
                u.avatar_url AS u_avatar_url
            FROM board_members m
            LEFT JOIN profiles u ON u.id = m.user_id
            WHERE m.board_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(MemberWithProfile {
                    member: member_from_row(r)?,
                    profile: summary_from_row(r, "u"),
                })
            })
            .collect()
    }

    /// Add a member. Relies on the `(board_id, user_id)` unique constraint.
    pub async fn add(
        &self,
        board_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<MemberWithProfile, DbError> {
        let row = sqlx::query(
            r#"
            WITH inserted AS (
                INSERT INTO board_members (board_id, user_id, role)
                VALUES ($1, $2, $3)
                ON CONFLICT (board_id, user_id) DO NOTHING
                RETURNING id, board_id, user_id, role, joined_at
            )
            SELECT
                m.id, m.board_id, m.user_id, m.role, m.joined_at,
                u.id AS u_id, u.email AS u_email, u.full_name AS u_full_name,
                u.avatar_url AS u_avatar_url
            FROM inserted m
            LEFT JOIN profiles u ON u.id = m.user_id
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .bind(role.as_str())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| super::missing_parent(e, "board", board_id))?
        .ok_or_else(|| DbError::Conflict("User is already a member of this board".into()))?;

        Ok(MemberWithProfile {
            member: member_from_row(&row)?,
            profile: summary_from_row(&row, "u"),
        })
    }

    pub async fn set_role(&self, member_id: Uuid, role: Role) -> Result<BoardMember, DbError> {
        let row = sqlx::query(
            r#"
            UPDATE board_members SET role = $2
            WHERE id = $1
            RETURNING id, board_id, user_id, role, joined_at
            "#,
        )
        .bind(member_id)
        .bind(role.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("member", member_id))?;

        member_from_row(&row)
    }

    pub async fn remove(&self, member_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM board_members WHERE id = $1")
            .bind(member_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("member", member_id));
        }
        Ok(())
    }
}
