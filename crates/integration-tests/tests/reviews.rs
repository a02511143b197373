//! Integration tests for product reviews.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p bramble-api)
//!
//! Run with: cargo test -p bramble-integration-tests -- --ignored

use bramble_integration_tests::{TestContext, unique};
use serde_json::{Value, json};

async fn seed_product(ctx: &TestContext, token: &str) -> i64 {
    let resp = ctx
        .client
        .post(ctx.url("/api/products"))
        .bearer_auth(token)
        .json(&json!({"name": unique("Reviewable"), "price": "7.25", "stock_quantity": 9}))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.expect("Failed to parse product");
    body["id"].as_i64().expect("product id")
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn anonymous_review_reads_are_denied() {
    let ctx = TestContext::new();

    let resp = ctx
        .client
        .get(ctx.url("/api/reviews"))
        .send()
        .await
        .expect("Failed to list reviews");

    assert_eq!(resp.status(), 403);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn author_is_always_the_acting_user() {
    let ctx = TestContext::new();
    let username = unique("critic");
    let (id, token) = ctx.register_and_login(&username).await;
    let product = seed_product(&ctx, &token).await;

    // The payload tries to claim another author; the field is ignored.
    let resp = ctx
        .client
        .post(ctx.url("/api/reviews"))
        .bearer_auth(&token)
        .json(&json!({
            "product": product,
            "rating": 4,
            "comment": "Solid.",
            "user": 999_999,
        }))
        .send()
        .await
        .expect("Failed to create review");

    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.expect("Failed to parse review");
    assert_eq!(body["user_id"], id);
    assert_eq!(body["username"], username.as_str());
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn out_of_range_ratings_are_rejected() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_and_login(&unique("harsh")).await;
    let product = seed_product(&ctx, &token).await;

    for rating in [0, 6] {
        let resp = ctx
            .client
            .post(ctx.url("/api/reviews"))
            .bearer_auth(&token)
            .json(&json!({"product": product, "rating": rating, "comment": "Hm."}))
            .send()
            .await
            .expect("Failed to send review");
        assert_eq!(resp.status(), 400);

        let body: Value = resp.json().await.expect("Failed to parse body");
        assert!(body["errors"]["rating"].is_array());
    }
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn updates_keep_the_original_author() {
    let ctx = TestContext::new();
    let (author_id, author_token) = ctx.register_and_login(&unique("first")).await;
    let product = seed_product(&ctx, &author_token).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/reviews"))
        .bearer_auth(&author_token)
        .json(&json!({"product": product, "rating": 2, "comment": "Meh."}))
        .send()
        .await
        .expect("Failed to create review");
    let review: Value = resp.json().await.expect("Failed to parse review");

    // A different user edits the review; the author does not change.
    let (_, editor_token) = ctx.register_and_login(&unique("second")).await;
    let resp = ctx
        .client
        .put(ctx.url(&format!("/api/reviews/{}", review["id"])))
        .bearer_auth(&editor_token)
        .json(&json!({"product": product, "rating": 5, "comment": "Changed my mind."}))
        .send()
        .await
        .expect("Failed to update review");

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("Failed to parse review");
    assert_eq!(body["user_id"], author_id);
    assert_eq!(body["rating"], 5);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn delete_removes_the_review() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_and_login(&unique("gone")).await;
    let product = seed_product(&ctx, &token).await;

    let resp = ctx
        .client
        .post(ctx.url("/api/reviews"))
        .bearer_auth(&token)
        .json(&json!({"product": product, "rating": 3, "comment": "Fine."}))
        .send()
        .await
        .expect("Failed to create review");
    let review: Value = resp.json().await.expect("Failed to parse review");

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/api/reviews/{}", review["id"])))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete review");
    assert_eq!(resp.status(), 204);

    let resp = ctx
        .client
        .get(ctx.url(&format!("/api/reviews/{}", review["id"])))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to re-fetch review");
    assert_eq!(resp.status(), 404);
}
