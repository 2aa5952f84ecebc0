//! Shared test helpers for integration tests.
//!
//! Every `TestApp` runs the full router against its own in-memory store
//! and in-memory user directory.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use passage_api::{AppState, build_router};
use passage_cache::StoreManager;
use passage_cache::memory::MemoryStore;
use passage_core::config::{
    AppConfig, AuthConfig, DatabaseConfig, DirectoryConfig, LoggingConfig, RateLimitConfig,
    ServerConfig, StoreConfig,
};
use passage_database::{MemoryUserDirectory, PasswordHasher};

/// Password that satisfies the password policy.
pub const PASSWORD: &str = "Str0ng!Pass";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Direct handle on the user directory
    pub directory: MemoryUserDirectory,
    /// Direct handle on the coordination store
    pub store: Arc<StoreManager>,
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

fn test_config(rate_limits: bool, trust_forwarded_for: bool) -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        directory: DirectoryConfig {
            provider: "memory".to_string(),
        },
        database: DatabaseConfig::default(),
        store: StoreConfig {
            provider: "memory".to_string(),
            ..StoreConfig::default()
        },
        auth: AuthConfig {
            jwt_secret: Some("integration-test-secret-value".to_string()),
            password_hash_memory_kib: 64,
            password_hash_iterations: 1,
            ..AuthConfig::default()
        },
        rate_limit: RateLimitConfig {
            enabled: rate_limits,
            trust_forwarded_for,
            ..RateLimitConfig::default()
        },
        logging: LoggingConfig::default(),
    }
}

impl TestApp {
    /// App with rate limiting switched off.
    pub fn new() -> Self {
        Self::build(test_config(false, false))
    }

    /// App with the default rate limit policies enforced.
    pub fn with_rate_limits() -> Self {
        Self::build(test_config(true, false))
    }

    /// Rate-limited app that trusts `X-Forwarded-For` from its proxy.
    pub fn with_rate_limits_behind_proxy() -> Self {
        Self::build(test_config(true, true))
    }

    fn build(config: AppConfig) -> Self {
        let hasher = PasswordHasher::from_config(&config.auth).expect("hasher");
        let directory = MemoryUserDirectory::new(hasher);
        let store = Arc::new(StoreManager::from_provider(Arc::new(MemoryStore::new())));
        let state = AppState::new(
            Arc::new(config),
            Arc::new(directory.clone()),
            Arc::clone(&store),
        )
        .expect("state");

        Self {
            router: build_router(state),
            directory,
            store,
        }
    }

    /// Send a request through the router.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.request_from(None, method, path, body, headers).await
    }

    /// Send a request as if it arrived on a socket from `peer`.
    pub async fn request_from(
        &self,
        peer: Option<SocketAddr>,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(addr) = peer {
            builder = builder.extension(ConnectInfo(addr));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// POST a JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::POST, path, Some(body), &[]).await
    }

    /// POST with a bearer credential and no body.
    pub async fn post_authed(&self, path: &str, token: &str) -> TestResponse {
        let bearer = format!("Bearer {token}");
        self.request(Method::POST, path, None, &[("authorization", bearer.as_str())])
            .await
    }

    /// GET with a bearer credential.
    pub async fn get_authed(&self, path: &str, token: &str) -> TestResponse {
        let bearer = format!("Bearer {token}");
        self.request(Method::GET, path, None, &[("authorization", bearer.as_str())])
            .await
    }

    /// Register and return the response body, asserting 201.
    pub async fn register(&self, email: &str, username: &str) -> Value {
        let response = self.post("/api/auth/register", register_body(email, username)).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body
    }

    /// Register a user and grant it the admin role. Returns (user id, access token).
    pub async fn admin(&self) -> (Uuid, String) {
        let body = self.register("root@x.com", "rootadmin").await;
        let id = user_id(&body);
        self.directory.grant_role(id, "admin").await.expect("grant");
        (id, access_token(&body).to_string())
    }
}

/// Socket peer address `192.0.2.{n}`.
pub fn peer(n: u8) -> SocketAddr {
    SocketAddr::from(([192, 0, 2, n], 40000))
}

/// A valid registration body.
pub fn register_body(email: &str, username: &str) -> Value {
    json!({
        "email": email,
        "username": username,
        "password": PASSWORD,
        "first_name": "Omar",
        "last_name": "Z",
    })
}

/// Access credential from a register/login body.
pub fn access_token(body: &Value) -> &str {
    body["tokens"]["access_token"].as_str().expect("access_token")
}

/// Refresh credential from a register/login/refresh body.
pub fn refresh_token(body: &Value) -> &str {
    body["tokens"]["refresh_token"].as_str().expect("refresh_token")
}

/// User id from a register/login body.
pub fn user_id(body: &Value) -> Uuid {
    body["user"]["id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("user id")
}
