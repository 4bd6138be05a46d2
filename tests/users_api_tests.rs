use etude::testing::{test_config, TestApp};

#[tokio::test]
async fn test_register_returns_user_without_privileges() {
    let app = TestApp::new().await;

    // Privileged flags in the payload are ignored on the public route
    let body = serde_json::json!({
        "email": "eve@example.com",
        "password": "Secret123!",
        "first_name": "Eve",
        "is_superuser": true,
        "is_verified": true,
    });
    let res = app
        .client
        .post(&app.url("/api/v1/auth/register"), &body.to_string())
        .await;

    assert_eq!(res.status, 200, "body: {}", res.body);
    assert_eq!(res.data()["email"], "eve@example.com");
    assert_eq!(res.data()["is_superuser"], false);
    assert_eq!(res.data()["is_verified"], false);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = TestApp::new().await;

    let first = app.register("dup@example.com", "Secret123!", "One").await;
    assert_eq!(first.status, 200);

    let second = app.register("Dup@Example.com", "Other456!", "Two").await;
    assert_eq!(second.status, 409);
    assert_eq!(second.error()["code"], "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn test_login_and_me_round_trip() {
    let app = TestApp::new().await;
    app.register("alice@example.com", "Secret123!", "Alice").await;

    let token = app.login("alice@example.com", "Secret123!").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users/me"), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["email"], "alice@example.com");
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.register("bob@example.com", "Secret123!", "Bob").await;

    let body = serde_json::json!({"email": "bob@example.com", "password": "nope"});
    let res = app
        .client
        .post(&app.url("/api/v1/auth/login"), &body.to_string())
        .await;

    assert_eq!(res.status, 401);
    assert_eq!(res.error()["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_with_garbage_token_is_unauthorized() {
    let app = TestApp::new().await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users/me"), "not-a-token")
        .await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn test_logout_revokes_the_token() {
    let app = TestApp::new().await;
    app.register("carol@example.com", "Secret123!", "Carol").await;
    let token = app.login("carol@example.com", "Secret123!").await;

    let res = app
        .client
        .post_with_auth(&app.url("/api/v1/auth/logout"), &token, "{}")
        .await;
    assert_eq!(res.status, 200, "body: {}", res.body);

    // The server-side row is gone, so the same bearer token is dead
    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users/me"), &token)
        .await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn test_users_list_requires_superuser() {
    let app = TestApp::new().await;
    app.register("plain@example.com", "Secret123!", "Plain").await;
    let token = app.login("plain@example.com", "Secret123!").await;

    // Valid credential, insufficient privilege: 403, not 401
    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users"), &token)
        .await;
    assert_eq!(res.status, 403);

    let res = app.client.get(&app.url("/api/v1/users")).await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn test_users_list_ordered_by_id() {
    let app = TestApp::new().await;
    app.create_superuser("admin@example.com", "AdminSecret1!").await;
    app.register("b@example.com", "Secret123!", "B").await;
    app.register("a@example.com", "Secret123!", "A").await;

    let token = app.login("admin@example.com", "AdminSecret1!").await;
    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users"), &token)
        .await;
    assert_eq!(res.status, 200, "body: {}", res.body);

    let users = res.data();
    let ids: Vec<i64> = users
        .as_array()
        .expect("Expected an array")
        .iter()
        .map(|u| u["id"].as_i64().unwrap())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_users_list_not_memoized_in_testing_environment() {
    // The testing environment selects the no-op cache backend, so each
    // decorated read hits the store and sees fresh data.
    let app = TestApp::new().await;
    app.create_superuser("admin@example.com", "AdminSecret1!").await;
    let token = app.login("admin@example.com", "AdminSecret1!").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users"), &token)
        .await;
    let before = res.data().as_array().unwrap().len();

    app.register("newcomer@example.com", "Secret123!", "New").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users"), &token)
        .await;
    let after = res.data().as_array().unwrap().len();

    assert_eq!(after, before + 1);
}

#[tokio::test]
async fn test_users_list_memoized_when_cache_enabled() {
    // Development environment with caching on: the second read is served
    // from the cache until the namespace is invalidated.
    let mut config = test_config();
    config.environment = "development".to_string();
    let app = TestApp::with_config(config).await;

    app.create_superuser("admin@example.com", "AdminSecret1!").await;
    let token = app.login("admin@example.com", "AdminSecret1!").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users"), &token)
        .await;
    let before = res.data().as_array().unwrap().len();

    app.register("hidden@example.com", "Secret123!", "Hidden").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users"), &token)
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), before);

    // Invalidation exposes the new row on the next read
    app.state
        .cache
        .invalidate(&app.state.config.cache.users_list_namespace)
        .await
        .expect("Failed to invalidate");

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users"), &token)
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), before + 1);
}

#[tokio::test]
async fn test_admin_patch_invalidates_users_list_cache() {
    let mut config = test_config();
    config.environment = "development".to_string();
    let app = TestApp::with_config(config).await;

    app.create_superuser("admin@example.com", "AdminSecret1!").await;
    let user = app.register("target@example.com", "Secret123!", "Target").await;
    let target_id = user.data()["id"].as_i64().unwrap();

    let token = app.login("admin@example.com", "AdminSecret1!").await;

    // Prime the cache
    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users"), &token)
        .await;
    assert_eq!(res.status, 200);

    // Admin patch flips a flag and clears the namespace
    let res = app
        .client
        .patch_with_auth(
            &app.url(&format!("/api/v1/users/{}", target_id)),
            &token,
            r#"{"is_verified": true}"#,
        )
        .await;
    assert_eq!(res.status, 200, "body: {}", res.body);
    assert_eq!(res.data()["is_verified"], true);

    // The next list read reflects the change instead of the cached page
    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users"), &token)
        .await;
    let users = res.data();
    let target = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"].as_i64() == Some(target_id))
        .expect("Target user must be listed");
    assert_eq!(target["is_verified"], true);
}

#[tokio::test]
async fn test_patch_me_cannot_escalate_privileges() {
    let app = TestApp::new().await;
    app.register("self@example.com", "Secret123!", "Self").await;
    let token = app.login("self@example.com", "Secret123!").await;

    let res = app
        .client
        .patch_with_auth(
            &app.url("/api/v1/users/me"),
            &token,
            r#"{"first_name": "Renamed", "is_superuser": true}"#,
        )
        .await;

    assert_eq!(res.status, 200, "body: {}", res.body);
    assert_eq!(res.data()["first_name"], "Renamed");
    assert_eq!(res.data()["is_superuser"], false);
}

#[tokio::test]
async fn test_get_user_by_id_superuser_only() {
    let app = TestApp::new().await;
    app.create_superuser("admin@example.com", "AdminSecret1!").await;
    let created = app.register("lookup@example.com", "Secret123!", "Look").await;
    let id = created.data()["id"].as_i64().unwrap();

    let admin_token = app.login("admin@example.com", "AdminSecret1!").await;
    let res = app
        .client
        .get_with_auth(&app.url(&format!("/api/v1/users/{}", id)), &admin_token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["email"], "lookup@example.com");

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users/999999"), &admin_token)
        .await;
    assert_eq!(res.status, 404);
}
