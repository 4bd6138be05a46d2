use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use tower_cookies::CookieManagerLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::admin::auth::AdminAuth;
use crate::auth::rate_limit::{rate_limit_middleware, RateLimit, RateLimiter};
use crate::auth::strategy::DatabaseStrategy;
use crate::auth::token_store::AccessTokenStore;
use crate::cache::CacheService;
use crate::config::Config;
use crate::controllers::{self, AppState};
use crate::error::EtudeError;
use crate::mailer::Mailer;
use crate::migrations::Migrator;
use crate::openapi::ApiDoc;
use crate::users::manager::UserManager;
use crate::users::store::UserStore;

/// The assembled application: configuration, storage, and every component
/// wired once at startup.
pub struct App {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
    pub state: AppState,
}

impl App {
    /// Create a new application from environment configuration.
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::from_env()?;
        Self::with_config(config).await
    }

    /// Create a new application with a given config.
    pub async fn with_config(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Arc::new(config);
        let db = crate::db::connect(&config).await?;

        // Run pending migrations automatically on startup
        tracing::info!("Running pending database migrations...");
        Migrator::up(&db, None).await?;
        tracing::info!("Migrations complete.");

        let cache = Self::init_cache(&config).await;

        let limit: RateLimit = config
            .rate_limit
            .default_limit
            .parse()
            .map_err(EtudeError::Internal)?;
        let rate_limiter = Arc::new(RateLimiter::new(limit));

        let mailer = Mailer::new(
            config.smtp.clone(),
            config.site.name.clone(),
            config.is_prod(),
        );

        let users = UserStore::new(db.clone());
        let tokens = AccessTokenStore::new(db.clone());
        let strategy = DatabaseStrategy::new(tokens, config.access_token.lifetime_seconds);
        let manager = UserManager::new(users.clone(), mailer, config.clone());
        let admin_auth = AdminAuth::new(config.clone(), users.clone(), strategy.clone());

        let state = AppState {
            db: db.clone(),
            config: config.clone(),
            cache,
            rate_limiter,
            users,
            strategy,
            manager,
            admin_auth,
        };

        Ok(App { config, db, state })
    }

    /// Select the cache backend once, at startup.
    ///
    /// Caching disabled, or the `testing` environment, means the no-op
    /// backend; call sites keep the same shape either way.
    async fn init_cache(config: &Config) -> CacheService {
        if !config.cache.enabled || config.is_testing() {
            tracing::info!("Caching disabled");
            return CacheService::noop();
        }

        #[cfg(feature = "redis")]
        if let Some(ref redis_url) = config.cache.redis_url {
            match crate::cache::RedisCache::new(redis_url).await {
                Ok(redis_cache) => {
                    tracing::info!("Redis cache connected");
                    return CacheService::new(redis_cache, config.cache.prefix.clone());
                }
                Err(e) => {
                    tracing::warn!(
                        "Redis connection failed, falling back to in-memory cache: {}",
                        e
                    );
                }
            }
        }

        tracing::info!("Using in-memory cache");
        CacheService::in_memory(config.cache.prefix.clone())
    }

    /// Build the Axum router.
    pub fn router(&self) -> Router {
        let state = self.state.clone();
        let is_dev = self.config.is_dev();

        let api = Router::new()
            .nest("/auth", controllers::auth::routes())
            .nest("/users", controllers::users::routes());

        let mut router = Router::new()
            .route("/", get(welcome))
            .nest("/api/v1", api)
            .merge(crate::admin::routes())
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ))
            .layer(CookieManagerLayer::new())
            .with_state(state);

        router = router.merge(Scalar::with_url("/api-docs", ApiDoc::openapi()));

        // Only add expensive tracing/request-id middleware in development mode.
        if is_dev {
            use tower_http::trace::DefaultMakeSpan;
            use tower_http::trace::DefaultOnRequest;
            use tower_http::trace::DefaultOnResponse;
            use tower_http::LatencyUnit;

            let x_request_id = axum::http::HeaderName::from_static("x-request-id");
            router = router
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(PropagateRequestIdLayer::new(x_request_id))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                        .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                        .on_response(
                            DefaultOnResponse::new()
                                .level(tracing::Level::INFO)
                                .latency_unit(LatencyUnit::Millis),
                        ),
                );
        }

        router
    }

    /// Run the application server until interrupted.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.config.server_addr();
        let router = self.router();

        tracing::info!("Etude server running on http://{}", addr);
        tracing::info!("API docs at http://{}/api-docs", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutting down Etude server...");
}

// ═══ Application endpoints ═══

#[derive(Serialize)]
struct WelcomeMessage {
    message: &'static str,
    docs: &'static str,
    status: &'static str,
}

/// Welcome page at `/`.
async fn welcome() -> impl IntoResponse {
    let msg = WelcomeMessage {
        message: "Welcome to Etude!",
        docs: "/api-docs",
        status: "running",
    };
    axum::Json(msg)
}
