use etude::auth::password::{hash_password, verify_and_update, verify_password};

#[test]
fn test_hash_and_verify_password() {
    let password = "secure_password_123";
    let hash = hash_password(password).expect("Failed to hash password");

    assert!(!hash.is_empty());
    assert_ne!(hash, password);

    let is_valid = verify_password(password, &hash).expect("Failed to verify password");
    assert!(is_valid);
}

#[test]
fn test_wrong_password_fails() {
    let correct_password = "correct123";
    let wrong_password = "wrong456";

    let hash = hash_password(correct_password).expect("Failed to hash");

    let is_valid = verify_password(wrong_password, &hash).expect("Failed to verify");
    assert!(!is_valid);
}

#[test]
fn test_case_sensitive_passwords() {
    let password = "Password123";
    let hash = hash_password(password).expect("Failed to hash");

    assert!(verify_password("Password123", &hash).expect("Failed to verify"));
    assert!(!verify_password("password123", &hash).expect("Failed to verify"));
    assert!(!verify_password("PASSWORD123", &hash).expect("Failed to verify"));
}

#[test]
fn test_hash_produces_different_results() {
    let password = "same_password";

    let hash1 = hash_password(password).expect("Failed to hash 1");
    let hash2 = hash_password(password).expect("Failed to hash 2");

    // Hashes should be different due to random salt
    assert_ne!(hash1, hash2);

    assert!(verify_password(password, &hash1).expect("Failed to verify 1"));
    assert!(verify_password(password, &hash2).expect("Failed to verify 2"));
}

#[test]
fn test_hash_format_is_argon2() {
    let password = "test123";
    let hash = hash_password(password).expect("Failed to hash");

    assert!(
        hash.starts_with("$argon2"),
        "Hash should be Argon2 format: {}",
        hash
    );
}

#[test]
fn test_invalid_hash_format_fails() {
    let password = "test123";
    let invalid_hashes = vec!["", "not a valid hash", "random_string_123", "$2b$10$invalid"];

    for invalid_hash in invalid_hashes {
        let result = verify_password(password, invalid_hash);
        assert!(
            result.is_err(),
            "Should fail for invalid hash format: {}",
            invalid_hash
        );
    }
}

#[test]
fn test_verify_and_update_current_scheme_no_rehash() {
    let password = "stable_password";
    let hash = hash_password(password).expect("Failed to hash");

    let (valid, updated) = verify_and_update(password, &hash).expect("Failed to verify");
    assert!(valid);
    assert!(
        updated.is_none(),
        "A freshly minted hash must not trigger a rehash"
    );
}

#[test]
fn test_verify_and_update_wrong_password_no_rehash() {
    let hash = hash_password("right").expect("Failed to hash");

    let (valid, updated) = verify_and_update("wrong", &hash).expect("Failed to verify");
    assert!(!valid);
    assert!(updated.is_none());
}

#[test]
fn test_verify_and_update_outdated_params_rehashes() {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Algorithm, Argon2, Params, Version,
    };

    // Mint a hash with non-default (weaker) cost parameters
    let password = "legacy_password";
    let weak_params = Params::new(8192, 1, 1, None).expect("params");
    let weak_argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, weak_params);
    let salt = SaltString::generate(&mut OsRng);
    let old_hash = weak_argon2
        .hash_password(password.as_bytes(), &salt)
        .expect("Failed to hash")
        .to_string();

    let (valid, updated) = verify_and_update(password, &old_hash).expect("Failed to verify");
    assert!(valid);

    let new_hash = updated.expect("Outdated parameters must trigger a rehash");
    assert_ne!(new_hash, old_hash);
    assert!(verify_password(password, &new_hash).expect("Failed to verify new hash"));

    // The upgraded hash is already current
    let (valid, updated) = verify_and_update(password, &new_hash).expect("Failed to verify");
    assert!(valid);
    assert!(updated.is_none());
}
