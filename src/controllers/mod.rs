use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::admin::auth::AdminAuth;
use crate::auth::rate_limit::RateLimiter;
use crate::auth::strategy::DatabaseStrategy;
use crate::cache::CacheService;
use crate::config::Config;
use crate::users::manager::UserManager;
use crate::users::store::UserStore;

/// Shared application state available in all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub cache: CacheService,
    pub rate_limiter: Arc<RateLimiter>,
    pub users: UserStore,
    pub strategy: DatabaseStrategy,
    pub manager: UserManager,
    pub admin_auth: AdminAuth,
}

pub mod auth;
pub mod users;
