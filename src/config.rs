use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// Built once at startup and passed into each component; nothing in the
/// crate reads ambient process state after construction.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server host (default: 127.0.0.1)
    pub server_host: String,

    /// Server port (default: 3000)
    pub server_port: u16,

    /// Environment: development, production, testing
    pub environment: String,

    /// Database connection URL (e.g. sqlite://etude.db, postgres://...)
    pub database_url: String,

    /// Secret used to sign the admin-console session cookie.
    pub session_secret: String,

    /// Minimum accepted password length (default: 8)
    pub min_password_length: usize,

    pub site: SiteConfig,
    pub access_token: AccessTokenConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub admin: AdminConfig,
    pub smtp: SmtpConfig,
}

/// Public identity of the deployment, used in outbound mail.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Display name used in email subjects and signatures.
    pub name: String,

    /// Base URL used to build verification / reset links.
    pub base_url: String,
}

/// Bearer-token settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenConfig {
    /// Token lifetime in seconds (default: 3600). A token whose age equals
    /// this value is already expired.
    pub lifetime_seconds: i64,

    /// Name of the authentication cookie.
    pub cookie_name: String,

    /// Secret for signing email-verification tokens.
    pub verification_token_secret: String,

    /// Secret for signing password-reset tokens.
    pub reset_password_token_secret: String,

    /// Lifetime of verification / reset tokens in seconds (default: 3600).
    pub action_token_lifetime_seconds: i64,
}

/// Cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Master switch. Disabled (or the `testing` environment) selects the
    /// no-op backend at startup.
    pub enabled: bool,

    /// Global key prefix (default: "etude-cache").
    pub prefix: String,

    /// Default entry TTL in seconds (default: 60).
    pub ttl_seconds: u64,

    /// Namespace for the cached users list.
    pub users_list_namespace: String,

    /// Redis URL (optional, e.g. redis://127.0.0.1:6379). Used when the
    /// `redis` feature is enabled; in-memory otherwise.
    pub redis_url: Option<String>,
}

/// Request throttling settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Limit string, e.g. "100/minute", "20/second", "500/hour".
    pub default_limit: String,
}

/// Admin-console settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// When `true`, the console has no login form of its own: its
    /// authentication backend fails every login attempt closed and the
    /// console is reached with the ordinary application auth cookie.
    pub public_auth: bool,
}

/// Outbound mail settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// When disabled outside production, mail is routed to the local
    /// development mail-catcher instead.
    pub enabled: bool,

    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub use_tls: bool,
}

/// Fixed development fallback target (MailHog / Mailpit).
pub const DEV_SMTP_HOST: &str = "127.0.0.1";
pub const DEV_SMTP_PORT: u16 = 1025;

impl Config {
    /// Load configuration from environment variables (with .env support).
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if present (ignore errors if missing)
        let _ = dotenvy::dotenv();

        Ok(Config {
            server_host: env_or("SERVER_HOST", "127.0.0.1"),
            server_port: parse_or("SERVER_PORT", 3000),
            environment: env_or("ENVIRONMENT", "development"),
            database_url: env_or("DATABASE_URL", "sqlite://etude.db?mode=rwc"),
            session_secret: env_or(
                "SESSION_SECRET",
                "etude-dev-session-secret-change-me-in-production",
            ),
            min_password_length: parse_or("MIN_PASSWORD_LENGTH", 8),
            site: SiteConfig {
                name: env_or("SITE_NAME", "Etude"),
                base_url: env_or("SITE_BASE_URL", "http://localhost:3000"),
            },
            access_token: AccessTokenConfig {
                lifetime_seconds: parse_or("ACCESS_TOKEN_LIFETIME_SECONDS", 3600),
                cookie_name: env_or("AUTH_COOKIE_NAME", "etude_auth"),
                verification_token_secret: env_or(
                    "VERIFICATION_TOKEN_SECRET",
                    "etude-dev-verification-secret-change-me",
                ),
                reset_password_token_secret: env_or(
                    "RESET_PASSWORD_TOKEN_SECRET",
                    "etude-dev-reset-secret-change-me",
                ),
                action_token_lifetime_seconds: parse_or("ACTION_TOKEN_LIFETIME_SECONDS", 3600),
            },
            cache: CacheConfig {
                enabled: parse_bool_or("CACHE_ENABLED", true),
                prefix: env_or("CACHE_PREFIX", "etude-cache"),
                ttl_seconds: parse_or("CACHE_TTL_SECONDS", 60),
                users_list_namespace: env_or("CACHE_USERS_LIST_NAMESPACE", "users-list"),
                redis_url: std::env::var("REDIS_URL").ok(),
            },
            rate_limit: RateLimitConfig {
                enabled: parse_bool_or("RATE_LIMIT_ENABLED", true),
                default_limit: env_or("RATE_LIMIT_DEFAULT", "100/minute"),
            },
            admin: AdminConfig {
                public_auth: parse_bool_or("ADMIN_PUBLIC_AUTH", false),
            },
            smtp: SmtpConfig {
                enabled: parse_bool_or("SMTP_ENABLED", false),
                host: env_or("SMTP_HOST", "localhost"),
                port: parse_or("SMTP_PORT", 587),
                username: env_or("SMTP_USERNAME", "noreply@etude.local"),
                password: env_or("SMTP_PASSWORD", ""),
                use_tls: parse_bool_or("SMTP_USE_TLS", false),
            },
        })
    }

    /// Check if running in development mode.
    pub fn is_dev(&self) -> bool {
        self.environment == "development"
    }

    /// Check if running in production mode.
    pub fn is_prod(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running under the test harness.
    pub fn is_testing(&self) -> bool {
        self.environment == "testing"
    }

    /// Whether auth cookies carry the `Secure` attribute.
    pub fn cookie_secure(&self) -> bool {
        self.is_prod()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_bool_or(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}
