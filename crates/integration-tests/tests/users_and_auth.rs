//! Integration tests for registration, login, and user visibility.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p bramble-api)
//!
//! Run with: cargo test -p bramble-integration-tests -- --ignored

use bramble_integration_tests::{TestContext, unique};
use serde_json::{Value, json};

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server"]
async fn anonymous_can_register() {
    let ctx = TestContext::new();
    let username = unique("reg");

    let resp = ctx
        .client
        .post(ctx.url("/api/users"))
        .json(&json!({"username": username, "password": "correct-horse-battery"}))
        .send()
        .await
        .expect("Failed to register");

    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["username"], username.as_str());
    // The hash never leaves the server.
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn duplicate_username_is_a_field_error() {
    let ctx = TestContext::new();
    let username = unique("dup");
    ctx.register(&username, "correct-horse-battery").await;

    let resp = ctx
        .client
        .post(ctx.url("/api/users"))
        .json(&json!({"username": username, "password": "correct-horse-battery"}))
        .send()
        .await
        .expect("Failed to send duplicate registration");

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert!(body["errors"]["username"][0]
        .as_str()
        .expect("username error")
        .contains("already exists"));
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn short_passwords_are_rejected() {
    let ctx = TestContext::new();

    let resp = ctx
        .client
        .post(ctx.url("/api/users"))
        .json(&json!({"username": unique("pw"), "password": "short"}))
        .send()
        .await
        .expect("Failed to send registration");

    assert_eq!(resp.status(), 400);
}

// ============================================================================
// Login & logout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server"]
async fn login_issues_a_usable_token() {
    let ctx = TestContext::new();
    let username = unique("login");
    let (id, token) = ctx.register_and_login(&username).await;

    let resp = ctx
        .client
        .get(ctx.url(&format!("/api/users/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to fetch own profile");

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["username"], username.as_str());
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn wrong_password_is_rejected() {
    let ctx = TestContext::new();
    let username = unique("badpw");
    ctx.register(&username, "correct-horse-battery").await;

    let resp = ctx
        .client
        .post(ctx.url("/api/auth/login"))
        .json(&json!({"username": username, "password": "not-the-password"}))
        .send()
        .await
        .expect("Failed to send login");

    assert_eq!(resp.status(), 403);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn logout_revokes_the_token() {
    let ctx = TestContext::new();
    let username = unique("logout");
    let (id, token) = ctx.register_and_login(&username).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), 204);

    // The revoked token no longer authenticates.
    let resp = ctx
        .client
        .get(ctx.url(&format!("/api/users/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to fetch profile");
    assert_eq!(resp.status(), 403);
}

// ============================================================================
// Visibility
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server"]
async fn anonymous_user_list_is_denied() {
    let ctx = TestContext::new();

    let resp = ctx
        .client
        .get(ctx.url("/api/users"))
        .send()
        .await
        .expect("Failed to list users");

    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["detail"], "Authentication credentials were not provided.");
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn regular_users_see_only_themselves() {
    let ctx = TestContext::new();
    let (id, token) = ctx.register_and_login(&unique("solo")).await;

    let resp = ctx
        .client
        .get(ctx.url("/api/users"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to list users");

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("Failed to parse body");
    let users = body.as_array().expect("user list");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"].as_i64(), Some(id));
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn other_profiles_read_as_missing() {
    let ctx = TestContext::new();
    let (other_id, _) = ctx.register_and_login(&unique("target")).await;
    let (_, token) = ctx.register_and_login(&unique("snoop")).await;

    let resp = ctx
        .client
        .get(ctx.url(&format!("/api/users/{other_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to fetch other profile");

    // Outside the visible set, so not even confirmed to exist.
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn users_can_update_their_own_profile() {
    let ctx = TestContext::new();
    let username = unique("edit");
    let (id, token) = ctx.register_and_login(&username).await;

    let resp = ctx
        .client
        .put(ctx.url(&format!("/api/users/{id}")))
        .bearer_auth(&token)
        .json(&json!({"email": "new@example.com"}))
        .send()
        .await
        .expect("Failed to update profile");

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["email"], "new@example.com");
    assert_eq!(body["username"], username.as_str());
}
