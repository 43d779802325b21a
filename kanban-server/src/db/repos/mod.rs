//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Uses JOINs for embedded profiles (no N+1)
//! - Handles conflicts via ON CONFLICT (no check-then-insert)
//! - Uses transactions for multi-step operations
//!
//! Embedded profile summaries are selected with a column prefix
//! (`o_` owner, `a_` assignee, `u_` user/profile) and read back with
//! [`summary_from_row`].

pub mod activity;
pub mod boards;
pub mod cards;
pub mod columns;
pub mod comments;
pub mod members;
pub mod positions;
pub mod profiles;

pub use activity::ActivityRepo;
pub use boards::BoardRepo;
pub use cards::CardRepo;
pub use columns::ColumnRepo;
pub use comments::CommentRepo;
pub use members::MemberRepo;
pub use positions::PositionRepo;
pub use profiles::ProfileRepo;

use std::str::FromStr;

use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use kanban_core::{
    ActivityLog, Board, BoardMember, Card, Column, Comment, Profile, ProfileSummary,
};

use crate::store::DbError;

pub(crate) fn profile_from_row(row: &PgRow) -> Profile {
    Profile {
        id: row.get("id"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Read a LEFT JOINed profile selected as `{prefix}_id`, `{prefix}_email`, ...
pub(crate) fn summary_from_row(row: &PgRow, prefix: &str) -> Option<ProfileSummary> {
    let id: Option<Uuid> = row.get(format!("{prefix}_id").as_str());
    let email: Option<String> = row.get(format!("{prefix}_email").as_str());

    Some(ProfileSummary {
        id: id?,
        email: email?,
        full_name: row.get(format!("{prefix}_full_name").as_str()),
        avatar_url: row.get(format!("{prefix}_avatar_url").as_str()),
    })
}

pub(crate) fn board_from_row(row: &PgRow) -> Board {
    Board {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(crate) fn member_from_row(row: &PgRow) -> Result<BoardMember, DbError> {
    Ok(BoardMember {
        id: row.get("id"),
        board_id: row.get("board_id"),
        user_id: row.get("user_id"),
        role: parse_stored(row.get("role"))?,
        joined_at: row.get("joined_at"),
    })
}

pub(crate) fn column_from_row(row: &PgRow) -> Column {
    Column {
        id: row.get("id"),
        board_id: row.get("board_id"),
        title: row.get("title"),
        position: row.get("position"),
        created_at: row.get("created_at"),
    }
}

pub(crate) fn card_from_row(row: &PgRow) -> Card {
    Card {
        id: row.get("id"),
        column_id: row.get("column_id"),
        title: row.get("title"),
        description: row.get("description"),
        position: row.get("position"),
        assignee_id: row.get("assignee_id"),
        due_date: row.get("due_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(crate) fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        card_id: row.get("card_id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(crate) fn activity_from_row(row: &PgRow) -> Result<ActivityLog, DbError> {
    Ok(ActivityLog {
        id: row.get("id"),
        board_id: row.get("board_id"),
        user_id: row.get("user_id"),
        action: parse_stored(row.get("action"))?,
        entity_type: parse_stored(row.get("entity_type"))?,
        entity_id: row.get("entity_id"),
        metadata: row.get("metadata"),
        created_at: row.get("created_at"),
    })
}

/// Parse a TEXT column holding one of the domain enums.
pub(crate) fn parse_stored<T>(value: String) -> Result<T, DbError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| DbError::Decode(e.to_string()))
}

/// Map a foreign-key violation to `NotFound` for the referenced resource.
pub(crate) fn missing_parent(err: sqlx::Error, resource: &'static str, id: Uuid) -> DbError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            DbError::not_found(resource, id)
        }
        _ => DbError::Sqlx(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::Role;

    #[test]
    fn stored_enums_parse() {
        let role: Role = parse_stored("admin".to_string()).unwrap();
        assert_eq!(role, Role::Admin);

        let err = parse_stored::<Role>("root".to_string()).unwrap_err();
        assert!(matches!(err, DbError::Decode(_)));
    }
}
