//! Authentication extractor
//!
//! Accepts the session token from either `Authorization: Bearer <token>` or
//! the session cookie, verifies it, and reloads the account so deactivated
//! or deleted users are rejected even while their token is still valid.

use crate::auth::cookie::extract_cookie;
use crate::error::ApiError;
use crate::policy::Actor;
use crate::repositories::UserRepository;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use fitpro_shared::errors::AuthError;

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub actor: Actor,
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = extract_token(&parts.headers, &app_state.config().auth.cookie_name)?;
        let claims = app_state.jwt().validate_token(&token)?;
        let user_id = claims.user_id()?;

        let user = UserRepository::find_by_id(app_state.db(), user_id)
            .await
            .map_err(ApiError::Internal)?
            .filter(|user| user.is_active)
            .ok_or(AuthError::InactiveAccount)?;

        Ok(AuthUser {
            actor: user.actor(),
        })
    }
}

/// Bearer header wins over the cookie when both are present
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Result<String, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let token = value
            .to_str()
            .ok()
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidToken)?;
        return Ok(token.to_string());
    }

    extract_cookie(headers, cookie_name).ok_or(AuthError::MissingToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};

    #[test]
    fn test_bearer_token_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_token(&headers, "auth-token").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_cookie_token_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("auth-token=abc.def.ghi"));
        assert_eq!(extract_token(&headers, "auth-token").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(
            extract_token(&headers, "auth-token").unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(
            extract_token(&HeaderMap::new(), "auth-token").unwrap_err(),
            AuthError::MissingToken
        );
    }
}
