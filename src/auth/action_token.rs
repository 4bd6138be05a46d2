use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::EtudeError;

type HmacSha256 = Hmac<Sha256>;

/// What a signed action token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// Email verification.
    Verify,
    /// Password reset.
    Reset,
}

impl TokenPurpose {
    fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Verify => "verify",
            TokenPurpose::Reset => "reset",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "verify" => Some(TokenPurpose::Verify),
            "reset" => Some(TokenPurpose::Reset),
            _ => None,
        }
    }
}

/// Claims carried by a validated action token.
#[derive(Debug, Clone)]
pub struct ActionClaims {
    pub user_id: i32,
    pub purpose: TokenPurpose,
    pub expires_at: i64,
    /// Binds the token to the state it was issued against: the email for
    /// verification tokens, the password hash for reset tokens. A state
    /// change invalidates every outstanding token, which is what makes
    /// these single-use without a second table.
    pub fingerprint: String,
}

/// Shortened SHA-256 digest used as the state fingerprint.
pub fn fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Sign a single-use, time-limited action token for a user.
pub fn sign(
    secret: &str,
    user_id: i32,
    purpose: TokenPurpose,
    lifetime_seconds: i64,
    fingerprint: &str,
) -> Result<String, EtudeError> {
    let expires_at = Utc::now().timestamp() + lifetime_seconds;
    let payload = format!(
        "{}:{}:{}:{}",
        user_id,
        purpose.as_str(),
        expires_at,
        fingerprint
    );

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| EtudeError::Internal(format!("Failed to key token signer: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", hex::encode(payload), signature))
}

/// Validate an action token and return its claims.
///
/// Fails with the invalid-token error on any defect: malformed encoding,
/// wrong signature, wrong purpose, or expiry (inclusive — a token exactly
/// at its expiry instant is rejected). Fingerprint matching is left to the
/// caller, which owns the state being compared against.
pub fn verify(
    secret: &str,
    token: &str,
    expected_purpose: TokenPurpose,
) -> Result<ActionClaims, EtudeError> {
    let invalid = || EtudeError::InvalidToken("Invalid or expired token".to_string());

    let (payload_hex, signature_hex) = token.split_once('.').ok_or_else(invalid)?;
    let payload_bytes = hex::decode(payload_hex).map_err(|_| invalid())?;
    let signature = hex::decode(signature_hex).map_err(|_| invalid())?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| EtudeError::Internal(format!("Failed to key token signer: {}", e)))?;
    mac.update(&payload_bytes);
    // Constant-time comparison.
    mac.verify_slice(&signature).map_err(|_| invalid())?;

    let payload = String::from_utf8(payload_bytes).map_err(|_| invalid())?;
    let mut parts = payload.splitn(4, ':');
    let user_id: i32 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(invalid)?;
    let purpose = parts
        .next()
        .and_then(TokenPurpose::parse)
        .ok_or_else(invalid)?;
    let expires_at: i64 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(invalid)?;
    let fingerprint = parts.next().ok_or_else(invalid)?.to_string();

    if purpose != expected_purpose {
        return Err(invalid());
    }
    if Utc::now().timestamp() >= expires_at {
        return Err(invalid());
    }

    Ok(ActionClaims {
        user_id,
        purpose,
        expires_at,
        fingerprint,
    })
}
