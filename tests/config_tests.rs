use etude::testing::test_config;
use etude::Config;

#[test]
fn test_from_env_parses_with_defaults() {
    let config = Config::from_env().expect("Failed to load config");

    assert_eq!(config.access_token.cookie_name, "etude_auth");
    assert_eq!(config.cache.prefix, "etude-cache");
    assert_eq!(config.cache.users_list_namespace, "users-list");
    assert_eq!(config.rate_limit.default_limit, "100/minute");
    assert!(config.min_password_length >= 1);
}

#[test]
fn test_environment_helpers() {
    let mut config = test_config();

    config.environment = "development".to_string();
    assert!(config.is_dev());
    assert!(!config.is_prod());
    assert!(!config.is_testing());
    assert!(!config.cookie_secure());

    config.environment = "production".to_string();
    assert!(config.is_prod());
    assert!(!config.is_dev());
    // Secure cookies only in production
    assert!(config.cookie_secure());

    config.environment = "testing".to_string();
    assert!(config.is_testing());
    assert!(!config.cookie_secure());
}

#[test]
fn test_server_addr_joins_host_and_port() {
    let mut config = test_config();
    config.server_host = "0.0.0.0".to_string();
    config.server_port = 8000;
    assert_eq!(config.server_addr(), "0.0.0.0:8000");
}

#[test]
fn test_default_limit_string_parses() {
    use etude::auth::rate_limit::RateLimit;

    let config = test_config();
    let limit: RateLimit = config
        .rate_limit
        .default_limit
        .parse()
        .expect("Default limit string must parse");
    assert_eq!(limit.max_requests, 100);
}
