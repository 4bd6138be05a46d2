use utoipa::OpenApi;

use crate::controllers::auth::{
    AuthResponse, EmailRequest, LoginRequest, MessageResponse, RegisterRequest,
    ResetPasswordRequest, VerifyRequest,
};
use crate::controllers::users::UserPatchRequest;
use crate::models::user::UserRead;

/// Auto-generated OpenAPI documentation for Etude.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Etude API",
        version = "0.1.0",
        description = "Etude: a batteries-included web application starter."
    ),
    paths(
        crate::controllers::auth::register,
        crate::controllers::auth::login,
        crate::controllers::auth::logout,
        crate::controllers::auth::request_verify_token,
        crate::controllers::auth::verify,
        crate::controllers::auth::forgot_password,
        crate::controllers::auth::reset_password,
        crate::controllers::users::list_users,
        crate::controllers::users::me,
        crate::controllers::users::update_me,
        crate::controllers::users::get_user,
        crate::controllers::users::update_user,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            EmailRequest,
            VerifyRequest,
            ResetPasswordRequest,
            MessageResponse,
            UserPatchRequest,
            UserRead,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User endpoints")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add the bearer security scheme to the OpenAPI spec. The same opaque
/// token also travels as the auth cookie.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
