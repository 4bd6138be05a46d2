use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use tower_cookies::Cookies;

use crate::controllers::AppState;
use crate::error::EtudeError;
use crate::models::user;

/// Pull the bearer credential off a request: `Authorization: Bearer` first,
/// then the auth cookie.
pub fn token_from(headers: &HeaderMap, cookies: &Cookies, cookie_name: &str) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
        .or_else(|| cookies.get(cookie_name).map(|c| c.value().to_string()))
}

/// Extractor resolving the request credential to an active user.
///
/// Usage in handlers:
/// ```rust,ignore
/// async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     // user is the authenticated user row
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = EtudeError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|_| EtudeError::Internal("Cookie layer not installed".to_string()))?;

        let token = token_from(
            &parts.headers,
            &cookies,
            &state.config.access_token.cookie_name,
        )
        .ok_or_else(|| EtudeError::Unauthorized("Missing credentials".to_string()))?;

        let user = state
            .strategy
            .read_token(&token, &state.users)
            .await?
            .ok_or_else(|| EtudeError::Unauthorized("Invalid or expired token".to_string()))?;

        if !user.is_active {
            return Err(EtudeError::Unauthorized("Inactive user".to_string()));
        }

        Ok(CurrentUser(user))
    }
}

/// Extractor requiring a superuser. A valid but unprivileged credential is
/// a 403; a missing or bad credential stays a 401.
#[derive(Debug, Clone)]
pub struct Superuser(pub user::Model);

impl FromRequestParts<AppState> for Superuser {
    type Rejection = EtudeError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_superuser {
            return Err(EtudeError::Forbidden(
                "Superuser privileges required".to_string(),
            ));
        }

        Ok(Superuser(user))
    }
}
