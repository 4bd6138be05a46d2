use chrono::Utc;

use crate::auth::token_store::AccessTokenStore;
use crate::error::EtudeError;
use crate::models::user;
use crate::users::store::UserStore;

/// Database-backed bearer-token strategy.
///
/// Tokens are opaque random strings stored server-side. Expiry is computed
/// lazily at read time from the stored creation timestamp; there is no
/// background sweep.
#[derive(Clone)]
pub struct DatabaseStrategy {
    tokens: AccessTokenStore,
    lifetime_seconds: i64,
}

impl DatabaseStrategy {
    pub fn new(tokens: AccessTokenStore, lifetime_seconds: i64) -> Self {
        DatabaseStrategy {
            tokens,
            lifetime_seconds,
        }
    }

    /// Mint a new token for the user and persist it. This is the login
    /// transition; it requires no prior state.
    pub async fn write_token(&self, user: &user::Model) -> Result<String, EtudeError> {
        let token = self.tokens.create(user.id).await?;
        Ok(token.token)
    }

    /// Resolve a token to its user.
    ///
    /// Returns `None` (never an error) when the token is unknown or
    /// expired, or the user row is gone. The boundary is inclusive: a token
    /// whose age equals the configured lifetime is already expired. Callers
    /// holding a session cookie must clear it on `None`.
    pub async fn read_token(
        &self,
        token: &str,
        users: &UserStore,
    ) -> Result<Option<user::Model>, EtudeError> {
        let Some(row) = self.tokens.get(token).await? else {
            return Ok(None);
        };

        let age = Utc::now().naive_utc() - row.created_at;
        if age.num_seconds() >= self.lifetime_seconds {
            return Ok(None);
        }

        users.get(row.user_id).await
    }

    /// Delete the server-side token row (logout revocation).
    pub async fn destroy_token(&self, token: &str) -> Result<(), EtudeError> {
        self.tokens.delete(token).await
    }
}
