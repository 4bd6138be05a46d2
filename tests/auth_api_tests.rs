use etude::auth::action_token::{fingerprint, sign, TokenPurpose};
use etude::testing::TestApp;

#[tokio::test]
async fn test_request_verify_token_is_enumeration_safe() {
    let app = TestApp::new().await;
    app.register("known@example.com", "Secret123!", "Known").await;

    let known = app
        .client
        .post(
            &app.url("/api/v1/auth/request-verify-token"),
            r#"{"email": "known@example.com"}"#,
        )
        .await;
    let unknown = app
        .client
        .post(
            &app.url("/api/v1/auth/request-verify-token"),
            r#"{"email": "ghost@example.com"}"#,
        )
        .await;

    // Identical answer whether or not the account exists
    assert_eq!(known.status, 200);
    assert_eq!(unknown.status, 200);
    assert_eq!(known.data()["message"], unknown.data()["message"]);
}

#[tokio::test]
async fn test_forgot_password_is_enumeration_safe() {
    let app = TestApp::new().await;
    app.register("known@example.com", "Secret123!", "Known").await;

    let known = app
        .client
        .post(
            &app.url("/api/v1/auth/forgot-password"),
            r#"{"email": "known@example.com"}"#,
        )
        .await;
    let unknown = app
        .client
        .post(
            &app.url("/api/v1/auth/forgot-password"),
            r#"{"email": "ghost@example.com"}"#,
        )
        .await;

    assert_eq!(known.status, 200);
    assert_eq!(unknown.status, 200);
    assert_eq!(known.data()["message"], unknown.data()["message"]);
}

#[tokio::test]
async fn test_verify_with_invalid_token_is_rejected() {
    let app = TestApp::new().await;

    let res = app
        .client
        .post(&app.url("/api/v1/auth/verify"), r#"{"token": "garbage"}"#)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error()["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_full_verify_flow_over_http() {
    let app = TestApp::new().await;
    let created = app.register("flow@example.com", "Secret123!", "Flow").await;
    let id = created.data()["id"].as_i64().unwrap() as i32;

    let token = sign(
        &app.state.config.access_token.verification_token_secret,
        id,
        TokenPurpose::Verify,
        3600,
        &fingerprint("flow@example.com"),
    )
    .expect("Failed to sign");

    let body = serde_json::json!({"token": token});
    let res = app
        .client
        .post(&app.url("/api/v1/auth/verify"), &body.to_string())
        .await;

    assert_eq!(res.status, 200, "body: {}", res.body);
    assert_eq!(res.data()["is_verified"], true);
}

#[tokio::test]
async fn test_full_reset_flow_over_http() {
    let app = TestApp::new().await;
    app.register("resetme@example.com", "OldSecret1!", "Reset").await;

    let user = app
        .state
        .users
        .get_by_email("resetme@example.com")
        .await
        .unwrap()
        .expect("User must exist");

    let token = sign(
        &app.state.config.access_token.reset_password_token_secret,
        user.id,
        TokenPurpose::Reset,
        3600,
        &fingerprint(&user.hashed_password),
    )
    .expect("Failed to sign");

    let body = serde_json::json!({"token": token, "password": "NewSecret2!"});
    let res = app
        .client
        .post(&app.url("/api/v1/auth/reset-password"), &body.to_string())
        .await;
    assert_eq!(res.status, 200, "body: {}", res.body);

    // Old password dead, new one live
    let old = serde_json::json!({"email": "resetme@example.com", "password": "OldSecret1!"});
    let res = app
        .client
        .post(&app.url("/api/v1/auth/login"), &old.to_string())
        .await;
    assert_eq!(res.status, 401);

    app.login("resetme@example.com", "NewSecret2!").await;
}

#[tokio::test]
async fn test_reset_with_invalid_token_is_rejected() {
    let app = TestApp::new().await;

    let res = app
        .client
        .post(
            &app.url("/api/v1/auth/reset-password"),
            r#"{"token": "garbage", "password": "NewSecret2!"}"#,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.error()["code"], "INVALID_TOKEN");
}
