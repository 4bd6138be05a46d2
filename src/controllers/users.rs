use std::time::Duration;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::EtudeError;
use crate::extractors::{CurrentUser, Pagination, Superuser};
use crate::models::user::UserRead;
use crate::response::ApiResponse;
use crate::users::manager::UserPatch;

use super::AppState;

// ── Request types ──

/// Profile patch body. Flag fields are only honored on the admin route;
/// the self-service route strips them.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserPatchRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

impl From<UserPatchRequest> for UserPatch {
    fn from(req: UserPatchRequest) -> Self {
        UserPatch {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            is_active: req.is_active,
            is_superuser: req.is_superuser,
            is_verified: req.is_verified,
        }
    }
}

// ── Routes ──

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(me).patch(update_me))
        .route("/{id}", get(get_user).patch(update_user))
}

// ── Handlers ──

/// List users ordered by id, read through the cache.
///
/// The cache key is built from the pagination arguments; a hit returns the
/// stored page unchanged, a miss queries the store and writes the page back
/// under the configured TTL. With caching disabled the same code path runs
/// against the no-op backend.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(Pagination),
    responses(
        (status = 200, description = "User list", body = ApiResponse<Vec<UserRead>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser required")
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Superuser(_admin): Superuser,
    pagination: Pagination,
) -> Result<ApiResponse<Vec<UserRead>>, EtudeError> {
    let namespace = &state.config.cache.users_list_namespace;
    let key = pagination.cache_key();

    if let Some(cached) = state.cache.get_json::<Vec<UserRead>>(namespace, &key).await? {
        return Ok(ApiResponse::success(cached));
    }

    let users: Vec<UserRead> = state
        .users
        .list(pagination.limit, pagination.offset)
        .await?
        .into_iter()
        .map(UserRead::from)
        .collect();

    state
        .cache
        .set_json(
            namespace,
            &key,
            &users,
            Some(Duration::from_secs(state.config.cache.ttl_seconds)),
        )
        .await?;

    Ok(ApiResponse::success(users))
}

/// Current user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserRead>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users"
)]
pub async fn me(CurrentUser(user): CurrentUser) -> ApiResponse<UserRead> {
    ApiResponse::success(UserRead::from(user))
}

/// Update the current user's own profile (privileged flags are stripped).
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = UserPatchRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserRead>),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Email already registered")
    ),
    tag = "users"
)]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UserPatchRequest>,
) -> Result<ApiResponse<UserRead>, EtudeError> {
    let updated = state.manager.update(user, payload.into(), true).await?;

    state
        .cache
        .invalidate(&state.config.cache.users_list_namespace)
        .await?;

    Ok(ApiResponse::success(UserRead::from(updated)))
}

/// Fetch a user by id (superuser only).
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    responses(
        (status = 200, description = "User", body = ApiResponse<UserRead>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser required"),
        (status = 404, description = "Not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Superuser(_admin): Superuser,
    Path(id): Path<i32>,
) -> Result<ApiResponse<UserRead>, EtudeError> {
    let user = state
        .users
        .get(id)
        .await?
        .ok_or_else(|| EtudeError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::success(UserRead::from(user)))
}

/// Update any user, flags included (superuser only).
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    request_body = UserPatchRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserRead>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser required"),
        (status = 404, description = "Not found")
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Superuser(_admin): Superuser,
    Path(id): Path<i32>,
    Json(payload): Json<UserPatchRequest>,
) -> Result<ApiResponse<UserRead>, EtudeError> {
    let target = state
        .users
        .get(id)
        .await?
        .ok_or_else(|| EtudeError::NotFound("User not found".to_string()))?;

    let updated = state.manager.update(target, payload.into(), false).await?;

    state
        .cache
        .invalidate(&state.config.cache.users_list_namespace)
        .await?;

    Ok(ApiResponse::success(UserRead::from(updated)))
}
