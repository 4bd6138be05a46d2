use etude::auth::action_token::{fingerprint, sign, verify, TokenPurpose};
use etude::error::EtudeError;

const SECRET: &str = "test-action-token-secret";

#[test]
fn test_sign_and_verify_round_trip() {
    let fp = fingerprint("alice@example.com");
    let token = sign(SECRET, 42, TokenPurpose::Verify, 3600, &fp).expect("Failed to sign");

    let claims = verify(SECRET, &token, TokenPurpose::Verify).expect("Failed to verify");
    assert_eq!(claims.user_id, 42);
    assert_eq!(claims.purpose, TokenPurpose::Verify);
    assert_eq!(claims.fingerprint, fp);
}

#[test]
fn test_wrong_secret_rejected() {
    let fp = fingerprint("alice@example.com");
    let token = sign(SECRET, 1, TokenPurpose::Verify, 3600, &fp).expect("Failed to sign");

    let result = verify("another-secret", &token, TokenPurpose::Verify);
    assert!(matches!(result, Err(EtudeError::InvalidToken(_))));
}

#[test]
fn test_wrong_purpose_rejected() {
    let fp = fingerprint("hash-fingerprint");
    let token = sign(SECRET, 1, TokenPurpose::Reset, 3600, &fp).expect("Failed to sign");

    // A reset token must not pass as a verification token
    let result = verify(SECRET, &token, TokenPurpose::Verify);
    assert!(matches!(result, Err(EtudeError::InvalidToken(_))));
}

#[test]
fn test_expired_token_rejected() {
    let fp = fingerprint("alice@example.com");
    // Zero lifetime: expires_at == now, and the boundary is inclusive
    let token = sign(SECRET, 1, TokenPurpose::Verify, 0, &fp).expect("Failed to sign");

    let result = verify(SECRET, &token, TokenPurpose::Verify);
    assert!(matches!(result, Err(EtudeError::InvalidToken(_))));
}

#[test]
fn test_tampered_payload_rejected() {
    let fp = fingerprint("alice@example.com");
    let token = sign(SECRET, 1, TokenPurpose::Verify, 3600, &fp).expect("Failed to sign");

    // Flip a character in the hex payload
    let (payload, signature) = token.split_once('.').unwrap();
    let mut tampered_payload: Vec<char> = payload.chars().collect();
    tampered_payload[0] = if tampered_payload[0] == '0' { '1' } else { '0' };
    let tampered: String = tampered_payload.into_iter().collect::<String>() + "." + signature;

    let result = verify(SECRET, &tampered, TokenPurpose::Verify);
    assert!(matches!(result, Err(EtudeError::InvalidToken(_))));
}

#[test]
fn test_malformed_tokens_rejected() {
    for garbage in ["", "no-dot-here", "nothex.nothex", "deadbeef.", ".deadbeef"] {
        let result = verify(SECRET, garbage, TokenPurpose::Verify);
        assert!(
            matches!(result, Err(EtudeError::InvalidToken(_))),
            "Expected rejection for {:?}",
            garbage
        );
    }
}

#[test]
fn test_fingerprint_is_stable_and_short() {
    let a = fingerprint("alice@example.com");
    let b = fingerprint("alice@example.com");
    let c = fingerprint("bob@example.com");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 16);
}
