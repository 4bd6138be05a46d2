use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::admin::auth::AdminAccess;
use crate::controllers::AppState;
use crate::models::user::UserRead;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct AdminLoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub message: String,
    pub user: UserRead,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/login", post(login))
        .route("/admin/logout", get(logout))
        .route("/page-missing", get(page_missing))
}

/// Console landing page. Every request re-authenticates the session; a
/// failure is a redirect, never an error page.
async fn dashboard(State(state): State<AppState>, cookies: Cookies) -> Response {
    match state.admin_auth.authenticate(&cookies).await {
        AdminAccess::Granted(user) => ApiResponse::success(AdminDashboard {
            message: "Etude admin console".to_string(),
            user: UserRead::from(user),
        })
        .into_response(),
        AdminAccess::Denied(redirect) => redirect.into_response(),
    }
}

/// Console login form submission.
async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<AdminLoginForm>,
) -> Redirect {
    if state
        .admin_auth
        .login(&cookies, &form.username, &form.password)
        .await
    {
        Redirect::to("/admin")
    } else {
        Redirect::to(crate::admin::auth::PAGE_MISSING)
    }
}

/// Console logout: clears the session unconditionally.
async fn logout(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    state.admin_auth.logout(&cookies).await;
    Redirect::to("/")
}

/// Neutral not-found destination for console authentication failures.
async fn page_missing() -> Response {
    let body: ApiResponse<()> = ApiResponse::error("NOT_FOUND", "Page not found");
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
