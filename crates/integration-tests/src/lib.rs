//! Integration tests for Bramble Market.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! cargo run -p bramble-cli -- migrate
//!
//! # Start the API server
//! cargo run -p bramble-api
//!
//! # Run integration tests
//! cargo test -p bramble-integration-tests -- --ignored
//! ```
//!
//! All tests are `#[ignore]`d by default because they need a running
//! server and database.

use reqwest::Client;
use serde_json::{Value, json};

/// Shared state for a test run: an HTTP client and the server base URL.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Build a context pointing at the server named by `BRAMBLE_API_URL`
    /// (default `http://localhost:8000`).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed.
    #[must_use]
    pub fn new() -> Self {
        let base_url =
            std::env::var("BRAMBLE_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_owned());
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");
        Self { client, base_url }
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Register a fresh user and return its id.
    ///
    /// # Panics
    ///
    /// Panics if registration does not return 201 with an id.
    pub async fn register(&self, username: &str, password: &str) -> i64 {
        let resp = self
            .client
            .post(self.url("/api/users"))
            .json(&json!({"username": username, "password": password}))
            .send()
            .await
            .expect("Failed to register user");
        assert_eq!(resp.status(), 201, "registration should succeed");

        let body: Value = resp.json().await.expect("Failed to parse user");
        body["id"].as_i64().expect("user id")
    }

    /// Log in and return a bearer token.
    ///
    /// # Panics
    ///
    /// Panics if login does not return 200 with a token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({"username": username, "password": password}))
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(resp.status(), 200, "login should succeed");

        let body: Value = resp.json().await.expect("Failed to parse login response");
        body["token"].as_str().expect("token").to_owned()
    }

    /// Register a fresh user and log them in, returning (id, token).
    pub async fn register_and_login(&self, username: &str) -> (i64, String) {
        let id = self.register(username, "correct-horse-battery").await;
        let token = self.login(username, "correct-horse-battery").await;
        (id, token)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A username that will not collide across test runs.
#[must_use]
pub fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let pid = std::process::id();
    format!("{prefix}_{pid}_{nanos}")
}
