use std::net::SocketAddr;

use axum::http::HeaderMap;
use sea_orm::DatabaseConnection;
use tokio::net::TcpListener;

use crate::config::{
    AccessTokenConfig, AdminConfig, CacheConfig, Config, RateLimitConfig, SiteConfig, SmtpConfig,
};
use crate::controllers::AppState;
use crate::users::manager::RegisterUser;

/// Configuration for tests: in-memory SQLite, the `testing` environment
/// (which selects the no-op cache backend), rate limiting off, mail routed
/// to the development catcher.
pub fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0, // OS assigns a random port
        environment: "testing".to_string(),
        database_url: "sqlite::memory:".to_string(),
        session_secret: "test-session-secret-at-least-32-bytes-long".to_string(),
        min_password_length: 8,
        site: SiteConfig {
            name: "Etude".to_string(),
            base_url: "http://test".to_string(),
        },
        access_token: AccessTokenConfig {
            lifetime_seconds: 3600,
            cookie_name: "etude_auth".to_string(),
            verification_token_secret: "test-verification-secret".to_string(),
            reset_password_token_secret: "test-reset-secret".to_string(),
            action_token_lifetime_seconds: 3600,
        },
        cache: CacheConfig {
            enabled: true,
            prefix: "etude-cache".to_string(),
            ttl_seconds: 60,
            users_list_namespace: "users-list".to_string(),
            redis_url: None,
        },
        rate_limit: RateLimitConfig {
            enabled: false,
            default_limit: "100/minute".to_string(),
        },
        admin: AdminConfig { public_auth: false },
        smtp: SmtpConfig {
            enabled: false,
            host: "localhost".to_string(),
            port: 587,
            username: "noreply@etude.local".to_string(),
            password: String::new(),
            use_tls: false,
        },
    }
}

/// A test application builder for integration testing.
///
/// Spins up an Etude server with an in-memory SQLite database.
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_register() {
///     let app = TestApp::new().await;
///     let res = app
///         .client
///         .post(
///             &app.url("/api/v1/auth/register"),
///             r#"{"email":"a@b.com","password":"secret123","first_name":"Ann"}"#,
///         )
///         .await;
///     assert_eq!(res.status, 200);
/// }
/// ```
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: TestClient,
    pub db: DatabaseConnection,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test app with the default test config.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a new test app with a custom config.
    pub async fn with_config(config: Config) -> Self {
        let app = crate::App::with_config(config)
            .await
            .expect("Failed to create test app");

        let state = app.state.clone();
        let db = app.db.clone();
        let router = app.router();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to get local addr");

        // Spawn the server in the background
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = TestClient::new(addr);

        TestApp {
            addr,
            client,
            db,
            state,
        }
    }

    /// Get the base URL for the test server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register a user through the public endpoint and return the response
    /// body.
    pub async fn register(&self, email: &str, password: &str, first_name: &str) -> TestResponse {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "first_name": first_name,
        });
        self.client
            .post(&self.url("/api/v1/auth/register"), &body.to_string())
            .await
    }

    /// Create a verified superuser directly through the manager (the
    /// trusted, unsafe path).
    pub async fn create_superuser(&self, email: &str, password: &str) -> crate::models::user::Model {
        self.state
            .manager
            .create(
                RegisterUser {
                    email: email.to_string(),
                    password: password.to_string(),
                    first_name: "Admin".to_string(),
                    is_active: Some(true),
                    is_superuser: Some(true),
                    is_verified: Some(true),
                },
                false,
            )
            .await
            .expect("Failed to create superuser")
    }

    /// Login and return the access token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });

        let res = self
            .client
            .post(&self.url("/api/v1/auth/login"), &body.to_string())
            .await;

        assert_eq!(res.status, 200, "Login failed: {}", res.body);

        let json: serde_json::Value = serde_json::from_str(&res.body).unwrap();
        json["data"]["access_token"].as_str().unwrap().to_string()
    }
}

/// A simple HTTP test client with helper methods.
#[derive(Clone)]
pub struct TestClient {
    inner: reqwest::Client,
    base_addr: SocketAddr,
}

impl TestClient {
    /// Create a new test client pointing at the given address.
    pub fn new(addr: SocketAddr) -> Self {
        TestClient {
            inner: reqwest::Client::new(),
            base_addr: addr,
        }
    }

    /// Create a client with a cookie store, for session-cookie flows (the
    /// admin console). Redirects are followed with cookies applied, so a
    /// successful console login lands on the dashboard.
    pub fn with_cookie_store(addr: SocketAddr) -> Self {
        TestClient {
            inner: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to build test client"),
            base_addr: addr,
        }
    }

    /// Send a GET request.
    pub async fn get(&self, url: &str) -> TestResponse {
        let res = self.inner.get(url).send().await.expect("GET request failed");
        TestResponse::from_response(res).await
    }

    /// Send a GET request with an auth token.
    pub async fn get_with_auth(&self, url: &str, token: &str) -> TestResponse {
        let res = self
            .inner
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("GET request failed");
        TestResponse::from_response(res).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, url: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed");
        TestResponse::from_response(res).await
    }

    /// Send a POST request with auth token and JSON body.
    pub async fn post_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .post(url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", token))
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed");
        TestResponse::from_response(res).await
    }

    /// Send a PATCH request with auth token and JSON body.
    pub async fn patch_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .patch(url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", token))
            .body(body.to_string())
            .send()
            .await
            .expect("PATCH request failed");
        TestResponse::from_response(res).await
    }

    /// Send a form-encoded POST request (the console login form).
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> TestResponse {
        let res = self
            .inner
            .post(url)
            .form(form)
            .send()
            .await
            .expect("POST request failed");
        TestResponse::from_response(res).await
    }

    /// Get the base URL.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.base_addr)
    }
}

/// A simplified HTTP response for test assertions.
#[derive(Debug)]
pub struct TestResponse {
    pub status: u16,
    pub body: String,
    pub headers: HeaderMap,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let mut headers = HeaderMap::new();
        for (name, value) in res.headers() {
            if let (Ok(name), Ok(value)) = (
                axum::http::HeaderName::from_bytes(name.as_ref()),
                axum::http::HeaderValue::from_bytes(value.as_bytes()),
            ) {
                headers.append(name, value);
            }
        }
        let body = res.text().await.unwrap_or_default();
        TestResponse {
            status,
            body,
            headers,
        }
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Failed to parse response as JSON")
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        let json = self.json();
        json["success"].as_bool().unwrap_or(false)
    }

    /// Get the data field from the response.
    pub fn data(&self) -> serde_json::Value {
        self.json()["data"].clone()
    }

    /// Get the error field from the response.
    pub fn error(&self) -> serde_json::Value {
        self.json()["error"].clone()
    }
}
