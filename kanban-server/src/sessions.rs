//! Bearer session issuing
//!
//! Tokens are opaque random strings stored in the `sessions` table and
//! presented as `Authorization: Bearer <token>`.

use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use kanban_core::{Email, Profile};

use crate::store::{DbError, KanbanStore};

const TOKEN_LEN: usize = 40;

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub profile: Profile,
    pub token: String,
}

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Issue a token for the profile with `email`. `ttl_days` of `None` never expires.
pub async fn issue(
    store: &dyn KanbanStore,
    email: &Email,
    ttl_days: Option<u32>,
) -> Result<IssuedSession, DbError> {
    let profile = store
        .profile_by_email(email)
        .await?
        .ok_or_else(|| DbError::not_found("profile", email.as_str()))?;

    let token = generate_token();
    let expires_at = ttl_days.map(|days| Utc::now() + Duration::days(i64::from(days)));
    store.create_session(profile.id, &token, expires_at).await?;

    tracing::info!(user_id = %profile.id, ?expires_at, "session issued");
    Ok(IssuedSession { profile, token })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn tokens_are_alphanumeric_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn issued_token_resolves_to_profile() {
        let store = MemoryStore::new();
        let email = Email::new("dev@example.com").unwrap();
        let profile = store.create_profile(&email, Some("Dev")).await.unwrap();

        let session = issue(&store, &email, Some(7)).await.unwrap();
        let resolved = store.resolve_session(&session.token).await.unwrap();
        assert_eq!(resolved.map(|p| p.id), Some(profile.id));
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let store = MemoryStore::new();
        let email = Email::new("nobody@example.com").unwrap();
        assert!(matches!(
            issue(&store, &email, None).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
