use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tower_cookies::{cookie::time::Duration as CookieDuration, Cookie, Cookies};
use utoipa::ToSchema;

use crate::error::EtudeError;
use crate::extractors::{token_from, CurrentUser};
use crate::models::user::UserRead;
use crate::response::ApiResponse;
use crate::users::manager::RegisterUser;

use super::AppState;

// ── Request / Response types ──

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserRead,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// ── Routes ──

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/request-verify-token", post(request_verify_token))
        .route("/verify", post(verify))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

// ── Handlers ──

/// Register a new user (safe creation: privileged flags are ignored).
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User created", body = ApiResponse<UserRead>),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid input")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ApiResponse<UserRead>, EtudeError> {
    let user = state
        .manager
        .create(
            RegisterUser {
                email: payload.email,
                password: payload.password,
                first_name: payload.first_name,
                is_active: None,
                is_superuser: None,
                is_verified: None,
            },
            true,
        )
        .await?;

    Ok(ApiResponse::success(UserRead::from(user)))
}

/// Log in with email and password. The bearer token is returned in the
/// body and set as the auth cookie.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, EtudeError> {
    let user = state
        .manager
        .authenticate(&payload.email, &payload.password)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| EtudeError::Unauthorized("Invalid email or password".to_string()))?;

    let token = state.strategy.write_token(&user).await?;

    cookies.add(
        Cookie::build((state.config.access_token.cookie_name.clone(), token.clone()))
            .path("/")
            .http_only(true)
            .secure(state.config.cookie_secure())
            .max_age(CookieDuration::seconds(
                state.config.access_token.lifetime_seconds,
            ))
            .build(),
    );

    Ok(ApiResponse::success(AuthResponse {
        access_token: token,
        user: UserRead::from(user),
    }))
}

/// Log out: the auth cookie is cleared and the server-side token row is
/// deleted, so the credential cannot be replayed.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<MessageResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
    headers: HeaderMap,
    CurrentUser(_user): CurrentUser,
) -> Result<ApiResponse<MessageResponse>, EtudeError> {
    if let Some(token) = token_from(&headers, &cookies, &state.config.access_token.cookie_name) {
        state.strategy.destroy_token(&token).await?;
    }

    cookies.remove(
        Cookie::build((state.config.access_token.cookie_name.clone(), ""))
            .path("/")
            .build(),
    );

    Ok(ApiResponse::success(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// Request a fresh email-verification token.
///
/// Always answers with the same generic message so the endpoint cannot be
/// used to probe which addresses are registered.
#[utoipa::path(
    post,
    path = "/api/v1/auth/request-verify-token",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Request accepted", body = ApiResponse<MessageResponse>)
    ),
    tag = "auth"
)]
pub async fn request_verify_token(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<ApiResponse<MessageResponse>, EtudeError> {
    if let Some(user) = state.users.get_by_email(&payload.email).await? {
        if let Err(err) = state.manager.request_verify(&user).await {
            tracing::debug!(email = %payload.email, "Verification request dropped: {err}");
        }
    }

    Ok(ApiResponse::success(MessageResponse {
        message: "If the account exists, a verification email has been sent.".to_string(),
    }))
}

/// Confirm an email address with a verification token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Email verified", body = ApiResponse<UserRead>),
        (status = 400, description = "Invalid token")
    ),
    tag = "auth"
)]
pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<ApiResponse<UserRead>, EtudeError> {
    let user = state.manager.verify(&payload.token).await?;
    Ok(ApiResponse::success(UserRead::from(user)))
}

/// Request a password-reset token. Same anti-enumeration posture as the
/// verification request.
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Request accepted", body = ApiResponse<MessageResponse>)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<ApiResponse<MessageResponse>, EtudeError> {
    if let Some(user) = state.users.get_by_email(&payload.email).await? {
        if let Err(err) = state.manager.forgot_password(&user).await {
            tracing::debug!(email = %payload.email, "Reset request dropped: {err}");
        }
    }

    Ok(ApiResponse::success(MessageResponse {
        message: "If the account exists, a reset email has been sent.".to_string(),
    }))
}

/// Set a new password with a reset token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Invalid token")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<ApiResponse<MessageResponse>, EtudeError> {
    state
        .manager
        .reset_password(&payload.token, &payload.password)
        .await?;

    Ok(ApiResponse::success(MessageResponse {
        message: "Password has been reset successfully. Please log in again.".to_string(),
    }))
}
