pub mod auth;
pub mod routes;

pub use auth::{AdminAccess, AdminAuth};
pub use routes::routes;
