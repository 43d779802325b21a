//! Profile and session repository

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use kanban_core::{Email, Profile};

use super::profile_from_row;
use crate::store::DbError;

pub struct ProfileRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a profile. A taken email is a `Conflict`.
    pub async fn create(&self, email: &Email, full_name: Option<&str>) -> Result<Profile, DbError> {
        let row = sqlx::query(
            r#"
            INSERT INTO profiles (email, full_name)
            VALUES ($1, $2)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, full_name, avatar_url, created_at, updated_at
            "#,
        )
        .bind(email.as_str())
        .bind(full_name)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::Conflict(format!("profile '{}' already exists", email.as_str())))?;

        Ok(profile_from_row(&row))
    }

    pub async fn by_email(&self, email: &Email) -> Result<Option<Profile>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, full_name, avatar_url, created_at, updated_at
            FROM profiles
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.as_ref().map(profile_from_row))
    }

    pub async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), DbError> {
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(self.pool)
            .await
            .map_err(|e| super::missing_parent(e, "profile", user_id))?;
        Ok(())
    }

    /// Profile for a live session token.
    pub async fn by_session(&self, token: &str) -> Result<Option<Profile>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT p.id, p.email, p.full_name, p.avatar_url, p.created_at, p.updated_at
            FROM sessions s
            JOIN profiles p ON p.id = s.user_id
            WHERE s.token = $1
              AND (s.expires_at IS NULL OR s.expires_at > NOW())
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.as_ref().map(profile_from_row))
    }
}
