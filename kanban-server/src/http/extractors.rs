//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use kanban_core::{Profile, ValidationError};

use super::error::ApiError;
use crate::state::AppState;

/// The caller, resolved from `Authorization: Bearer <token>`
pub struct AuthUser(pub Profile);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;

        let profile = state
            .store()
            .resolve_session(token)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self(profile))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// JSON body whose rejection is `400 Invalid request body`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters whose rejection is a JSON validation error
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string whose rejection is `400 Invalid query string`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `?id=` for the delete endpoints
#[derive(Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// Parse an id taken from a query string or body.
///
/// Missing or blank ids fail with `missing`; malformed ids with an
/// invalid-format error.
pub fn parse_id(raw: Option<&str>, missing: &'static str) -> Result<Uuid, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::Required { message: missing })?;

    Uuid::parse_str(raw).map_err(|_| {
        ApiError::Validation(ValidationError::InvalidFormat {
            field: "id",
            reason: "invalid UUID format",
        })
    })
}

/// Deserialize a field that distinguishes "absent" (`None`) from an explicit
/// `null` (`Some(None)`). Use with `#[serde(default)]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        assignee_id: Option<Option<Uuid>>,
    }

    #[test]
    fn double_option_tells_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.assignee_id, None);

        let null: Patch = serde_json::from_str(r#"{"assignee_id": null}"#).unwrap();
        assert_eq!(null.assignee_id, Some(None));

        let id = Uuid::new_v4();
        let set: Patch = serde_json::from_str(&format!(r#"{{"assignee_id": "{id}"}}"#)).unwrap();
        assert_eq!(set.assignee_id, Some(Some(id)));
    }

    #[test]
    fn bearer_token_parsing() {
        let (parts, _) = Request::builder()
            .header(AUTHORIZATION, "Bearer abc123")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), Some("abc123"));

        let (parts, _) = Request::builder()
            .header(AUTHORIZATION, "Basic abc123")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), None);

        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn parse_id_messages() {
        let err = parse_id(None, "Card ID is required").unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::Required { message: "Card ID is required" })
        ));

        let err = parse_id(Some("nope"), "Card ID is required").unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::InvalidFormat { .. })));

        let id = Uuid::new_v4();
        assert_eq!(parse_id(Some(&id.to_string()), "x").unwrap(), id);
    }
}
