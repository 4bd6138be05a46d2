use std::sync::Arc;

use axum::response::Redirect;
use tower_cookies::{cookie::time::Duration as CookieDuration, Cookie, Cookies, Key};

use crate::auth::password::verify_and_update;
use crate::auth::strategy::DatabaseStrategy;
use crate::config::Config;
use crate::error::EtudeError;
use crate::models::user;
use crate::users::store::{UpdateUser, UserStore};

/// Name of the signed admin-console session cookie.
pub const ADMIN_SESSION_COOKIE: &str = "etude_admin_session";

/// Neutral destination for every console authentication failure. A plain
/// "not found" page hides the console's existence from holders of a valid
/// ordinary-user token.
pub const PAGE_MISSING: &str = "/page-missing";

/// Outcome of a console authentication check.
pub enum AdminAccess {
    Granted(user::Model),
    Denied(Redirect),
}

/// Authentication backend for the privileged console.
///
/// A stateful login/logout/authenticate protocol layered on the user store,
/// the password verifier and the database token strategy. Everything fails
/// closed: any error during authentication clears the session and redirects
/// to the neutral not-found destination.
#[derive(Clone)]
pub struct AdminAuth {
    config: Arc<Config>,
    users: UserStore,
    strategy: DatabaseStrategy,
    key: Key,
}

impl AdminAuth {
    pub fn new(config: Arc<Config>, users: UserStore, strategy: DatabaseStrategy) -> Self {
        let key = Key::derive_from(config.session_secret.as_bytes());
        AdminAuth {
            config,
            users,
            strategy,
            key,
        }
    }

    /// Attempt a console login. Returns `true` only when a superuser
    /// presented the correct password and a session token was stored.
    ///
    /// When `public_auth` is enabled the console has no login form of its
    /// own, so this always fails.
    pub async fn login(&self, cookies: &Cookies, email: &str, password: &str) -> bool {
        match self.try_login(cookies, email, password).await {
            Ok(ok) => ok,
            Err(err) => {
                tracing::error!("Console login error: {err}");
                false
            }
        }
    }

    async fn try_login(
        &self,
        cookies: &Cookies,
        email: &str,
        password: &str,
    ) -> Result<bool, EtudeError> {
        if self.config.admin.public_auth {
            return Ok(false);
        }
        if email.is_empty() || password.is_empty() {
            return Ok(false);
        }

        let Some(found) = self.users.get_by_email(email).await? else {
            tracing::warn!(email, "Console login: superuser not found");
            return Ok(false);
        };
        if !found.is_superuser {
            tracing::warn!(email, "Console login: superuser not found");
            return Ok(false);
        }

        let (valid, updated_hash) = verify_and_update(password, &found.hashed_password)?;
        if !valid {
            tracing::warn!(email, "Console login: invalid password");
            return Ok(false);
        }

        // Outdated hash scheme upgrades transparently on login
        let user = match updated_hash {
            Some(new_hash) => {
                self.users
                    .update(
                        found,
                        UpdateUser {
                            hashed_password: Some(new_hash),
                            ..Default::default()
                        },
                    )
                    .await?
            }
            None => found,
        };

        let token = self.strategy.write_token(&user).await?;
        cookies.signed(&self.key).add(self.session_cookie(token));

        tracing::info!(user_id = user.id, "Console login succeeded");
        Ok(true)
    }

    /// Check the session on a privileged-page request.
    ///
    /// The session credential resolves through the token strategy and the
    /// user must be active, verified and a superuser; any single failure
    /// clears the session and yields the neutral redirect.
    pub async fn authenticate(&self, cookies: &Cookies) -> AdminAccess {
        match self.try_authenticate(cookies).await {
            Ok(Some(user)) => {
                tracing::debug!(user_id = user.id, "Console access granted");
                AdminAccess::Granted(user)
            }
            Ok(None) => {
                self.clear_session(cookies);
                AdminAccess::Denied(Redirect::to(PAGE_MISSING))
            }
            Err(err) => {
                tracing::error!("Console authentication error: {err}");
                self.clear_session(cookies);
                AdminAccess::Denied(Redirect::to(PAGE_MISSING))
            }
        }
    }

    async fn try_authenticate(
        &self,
        cookies: &Cookies,
    ) -> Result<Option<user::Model>, EtudeError> {
        // In public-auth mode the console is reached with the ordinary
        // application auth cookie; otherwise with its own signed session.
        let token = if self.config.admin.public_auth {
            cookies
                .get(&self.config.access_token.cookie_name)
                .map(|c| c.value().to_string())
        } else {
            cookies
                .signed(&self.key)
                .get(ADMIN_SESSION_COOKIE)
                .map(|c| c.value().to_string())
        };

        let Some(token) = token else {
            return Ok(None);
        };

        let Some(user) = self.strategy.read_token(&token, &self.users).await? else {
            return Ok(None);
        };

        if !user.is_active || !user.is_verified || !user.is_superuser {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Clear the console session. The server-side token row is deleted as
    /// well, so the session cannot be replayed from a stolen cookie.
    pub async fn logout(&self, cookies: &Cookies) {
        if let Some(cookie) = cookies.signed(&self.key).get(ADMIN_SESSION_COOKIE) {
            if let Err(err) = self.strategy.destroy_token(cookie.value()).await {
                tracing::error!("Failed to revoke console session token: {err}");
            }
        }
        self.clear_session(cookies);
    }

    fn clear_session(&self, cookies: &Cookies) {
        cookies
            .signed(&self.key)
            .remove(Cookie::build((ADMIN_SESSION_COOKIE, "")).path("/").build());
    }

    fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((ADMIN_SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(self.config.cookie_secure())
            .max_age(CookieDuration::seconds(
                self.config.access_token.lifetime_seconds,
            ))
            .build()
    }
}
