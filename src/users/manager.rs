use std::sync::Arc;

use validator::ValidateEmail;

use crate::auth::action_token::{self, TokenPurpose};
use crate::auth::password::{hash_password, verify_and_update};
use crate::config::Config;
use crate::error::EtudeError;
use crate::mailer::Mailer;
use crate::models::user;
use crate::users::store::{CreateUser, UpdateUser, UserStore};

/// Registration input. The flag fields are only honored for unsafe
/// (trusted, internal) creation.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

/// Profile update input. Flags are stripped unless the caller is trusted.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

/// User lifecycle orchestration.
///
/// The manager is the only component that mints or verifies password
/// hashes, and the single entry point for user creation. `safe` creation
/// (the public registration path) rejects client-supplied privilege flags;
/// unsafe creation is reserved for trusted internal callers.
#[derive(Clone)]
pub struct UserManager {
    users: UserStore,
    mailer: Mailer,
    config: Arc<Config>,
}

impl UserManager {
    pub fn new(users: UserStore, mailer: Mailer, config: Arc<Config>) -> Self {
        UserManager {
            users,
            mailer,
            config,
        }
    }

    /// Access the underlying store (read paths that need no orchestration).
    pub fn user_store(&self) -> &UserStore {
        &self.users
    }

    /// Create a user.
    ///
    /// Validates the email format and password length, hashes the password,
    /// persists the row and, when the account still needs verification,
    /// sends the verification email. With `safe` set, privileged flags in
    /// the input are ignored.
    pub async fn create(
        &self,
        data: RegisterUser,
        safe: bool,
    ) -> Result<user::Model, EtudeError> {
        if !data.email.validate_email() {
            return Err(EtudeError::Validation(format!(
                "{:?} is not a valid email address",
                data.email
            )));
        }
        self.validate_password(&data.password)?;

        let (is_active, is_superuser, is_verified) = if safe {
            (true, false, false)
        } else {
            (
                data.is_active.unwrap_or(true),
                data.is_superuser.unwrap_or(false),
                data.is_verified.unwrap_or(false),
            )
        };

        let hashed_password = hash_password(&data.password)?;
        let created = self
            .users
            .create(CreateUser {
                email: data.email,
                hashed_password,
                first_name: data.first_name,
                is_active,
                is_superuser,
                is_verified,
            })
            .await?;

        tracing::info!(user_id = created.id, "User registered");

        if !created.is_verified {
            self.send_verification(&created)?;
        }

        Ok(created)
    }

    /// Verify credentials.
    ///
    /// Returns `None` for an unknown email or a wrong password without
    /// distinguishing the two; a miss still burns one hash computation so
    /// the timing matches the verification path. A valid password stored
    /// under an outdated hash scheme is transparently rehashed.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<user::Model>, EtudeError> {
        let Some(found) = self.users.get_by_email(email).await? else {
            let _ = hash_password(password);
            return Ok(None);
        };

        let (valid, updated_hash) = verify_and_update(password, &found.hashed_password)?;
        if !valid {
            return Ok(None);
        }

        let current = match updated_hash {
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

        Ok(Some(current))
    }

    /// Issue (and mail) a fresh verification token for an unverified user.
    pub async fn request_verify(&self, user: &user::Model) -> Result<(), EtudeError> {
        if !user.is_active {
            return Err(EtudeError::Validation("User is inactive".to_string()));
        }
        if user.is_verified {
            return Err(EtudeError::Validation("User is already verified".to_string()));
        }
        self.send_verification(user)
    }

    /// Validate a verification token and mark the user verified.
    ///
    /// The token binds to the email it was issued for, so it dies with an
    /// email change; a token for an already-verified user is rejected.
    pub async fn verify(&self, token: &str) -> Result<user::Model, EtudeError> {
        let claims = action_token::verify(
            &self.config.access_token.verification_token_secret,
            token,
            TokenPurpose::Verify,
        )?;

        let user = self
            .users
            .get(claims.user_id)
            .await?
            .ok_or_else(|| EtudeError::InvalidToken("Invalid or expired token".to_string()))?;

        if claims.fingerprint != action_token::fingerprint(&user.email) {
            return Err(EtudeError::InvalidToken(
                "Invalid or expired token".to_string(),
            ));
        }
        if user.is_verified {
            return Err(EtudeError::InvalidToken(
                "Token has already been used".to_string(),
            ));
        }

        let verified = self
            .users
            .update(
                user,
                UpdateUser {
                    is_verified: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = verified.id, "Email verified");
        self.mailer.send_email_confirmed(&verified);
        Ok(verified)
    }

    /// Issue (and mail) a password-reset token.
    pub async fn forgot_password(&self, user: &user::Model) -> Result<(), EtudeError> {
        if !user.is_active {
            return Err(EtudeError::Validation("User is inactive".to_string()));
        }

        // Binding to the current password hash makes the token single-use:
        // once the password changes, every outstanding token is dead.
        let token = action_token::sign(
            &self.config.access_token.reset_password_token_secret,
            user.id,
            TokenPurpose::Reset,
            self.config.access_token.action_token_lifetime_seconds,
            &action_token::fingerprint(&user.hashed_password),
        )?;

        let link = format!(
            "{}/api/v1/auth/reset-password?token={}",
            self.config.site.base_url, token
        );
        self.mailer.send_reset_password(user, &link);
        Ok(())
    }

    /// Validate a reset token and replace the user's password hash.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<user::Model, EtudeError> {
        let claims = action_token::verify(
            &self.config.access_token.reset_password_token_secret,
            token,
            TokenPurpose::Reset,
        )?;

        let user = self
            .users
            .get(claims.user_id)
            .await?
            .ok_or_else(|| EtudeError::InvalidToken("Invalid or expired token".to_string()))?;

        if !user.is_active {
            return Err(EtudeError::InvalidToken(
                "Invalid or expired token".to_string(),
            ));
        }
        if claims.fingerprint != action_token::fingerprint(&user.hashed_password) {
            return Err(EtudeError::InvalidToken(
                "Token has already been used".to_string(),
            ));
        }

        self.validate_password(new_password)?;
        let hashed_password = hash_password(new_password)?;

        let updated = self
            .users
            .update(
                user,
                UpdateUser {
                    hashed_password: Some(hashed_password),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = updated.id, "Password reset");
        Ok(updated)
    }

    /// Apply a profile update.
    ///
    /// With `safe` set, flag changes are stripped. An email change re-runs
    /// format validation, resets the verified flag, and can fail with the
    /// duplicate-email error; a password change goes through the usual
    /// validation and hashing.
    pub async fn update(
        &self,
        user: user::Model,
        patch: UserPatch,
        safe: bool,
    ) -> Result<user::Model, EtudeError> {
        let mut changes = UpdateUser::default();

        if let Some(ref email) = patch.email {
            if !email.validate_email() {
                return Err(EtudeError::Validation(format!(
                    "{:?} is not a valid email address",
                    email
                )));
            }
            if email.trim().to_lowercase() != user.email {
                changes.email = patch.email.clone();
                changes.is_verified = Some(false);
            }
        }
        if let Some(ref password) = patch.password {
            self.validate_password(password)?;
            changes.hashed_password = Some(hash_password(password)?);
        }
        if patch.first_name.is_some() {
            changes.first_name = patch.first_name.clone();
        }
        if !safe {
            changes.is_active = patch.is_active;
            changes.is_superuser = patch.is_superuser;
            // An explicit flag wins over the reset implied by an email change
            changes.is_verified = patch.is_verified.or(changes.is_verified);
        }

        self.users.update(user, changes).await
    }

    fn validate_password(&self, password: &str) -> Result<(), EtudeError> {
        if password.len() < self.config.min_password_length {
            return Err(EtudeError::Validation(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        Ok(())
    }

    fn send_verification(&self, user: &user::Model) -> Result<(), EtudeError> {
        let token = action_token::sign(
            &self.config.access_token.verification_token_secret,
            user.id,
            TokenPurpose::Verify,
            self.config.access_token.action_token_lifetime_seconds,
            &action_token::fingerprint(&user.email),
        )?;

        let link = format!(
            "{}/api/v1/auth/verify?token={}",
            self.config.site.base_url, token
        );
        self.mailer.send_verification_email(user, &link);
        Ok(())
    }
}
