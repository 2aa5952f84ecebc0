//! Login, refresh, logout, and logout-all over HTTP.

mod helpers;

use axum::http::{Method, StatusCode};
use serde_json::json;

use helpers::{PASSWORD, TestApp, access_token, refresh_token, user_id};

#[tokio::test]
async fn test_login_by_email_or_username() {
    let app = TestApp::new();
    app.register("a@x.com", "Alice").await;

    let by_email = app
        .post("/api/auth/login", json!({"email_or_username": "A@X.COM", "password": PASSWORD}))
        .await;
    assert_eq!(by_email.status, StatusCode::OK);

    let by_username = app
        .post("/api/auth/login", json!({"emailOrUsername": "alice", "password": PASSWORD}))
        .await;
    assert_eq!(by_username.status, StatusCode::OK);
    assert_eq!(by_username.body["user"]["username"], "Alice");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.register("a@x.com", "alice").await;

    let unknown = app
        .post("/api/auth/login", json!({"email_or_username": "nobody", "password": PASSWORD}))
        .await;
    let wrong = app
        .post("/api/auth/login", json!({"email_or_username": "alice", "password": "Wr0ng!Pass"}))
        .await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body.to_string(), wrong.body.to_string());
    assert_eq!(
        unknown.body["message"],
        "Email or password is incorrect. Please try again."
    );
}

#[tokio::test]
async fn test_me_requires_bearer() {
    let app = TestApp::new();
    let body = app.register("a@x.com", "alice").await;

    let missing = app.request(Method::GET, "/api/auth/me", None, &[]).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let me = app.get_authed("/api/auth/me", access_token(&body)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["id"], body["user"]["id"]);

    let with_refresh = app.get_authed("/api/auth/me", refresh_token(&body)).await;
    assert_eq!(with_refresh.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_and_old_refresh_is_spent() {
    let app = TestApp::new();
    let body = app.register("a@x.com", "alice").await;
    let old = refresh_token(&body).to_string();

    let rotated = app.post("/api/auth/refresh", json!({"refresh_token": old})).await;
    assert_eq!(rotated.status, StatusCode::OK);
    assert_ne!(refresh_token(&rotated.body), old);

    let reused = app
        .request(Method::POST, "/api/auth/refresh", None, &[("x-refresh-token", old.as_str())])
        .await;
    assert_eq!(reused.status, StatusCode::UNAUTHORIZED);

    let missing = app.post("/api/auth/refresh", json!({})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_revokes_access_and_own_refresh() {
    let app = TestApp::new();
    let body = app.register("a@x.com", "alice").await;
    let access = access_token(&body);
    let refresh = refresh_token(&body);
    let bearer = format!("Bearer {access}");

    let logout = app
        .request(
            Method::POST,
            "/api/auth/logout",
            None,
            &[("authorization", bearer.as_str()), ("x-refresh-token", refresh)],
        )
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body["ok"], true);

    assert_eq!(app.get_authed("/api/auth/me", access).await.status, StatusCode::UNAUTHORIZED);
    let reuse = app.post("/api/auth/refresh", json!({"refresh_token": refresh})).await;
    assert_eq!(reuse.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ignores_foreign_refresh_token() {
    let app = TestApp::new();
    let alice = app.register("a@x.com", "alice").await;
    let bob = app.register("b@x.com", "bob").await;
    let bearer = format!("Bearer {}", access_token(&alice));

    let logout = app
        .request(
            Method::POST,
            "/api/auth/logout",
            Some(json!({"refresh_token": refresh_token(&bob)})),
            &[("authorization", bearer.as_str())],
        )
        .await;
    assert_eq!(logout.status, StatusCode::OK);

    let bob_refresh = app
        .post("/api/auth/refresh", json!({"refresh_token": refresh_token(&bob)}))
        .await;
    assert_eq!(bob_refresh.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_all_kills_every_device() {
    let app = TestApp::new();
    let phone = app.register("a@x.com", "alice").await;
    let laptop = app
        .post("/api/auth/login", json!({"email_or_username": "alice", "password": PASSWORD}))
        .await
        .body;

    let response = app.post_authed("/api/auth/logout-all", access_token(&phone)).await;
    assert_eq!(response.status, StatusCode::OK);

    for body in [&phone, &laptop] {
        let me = app.get_authed("/api/auth/me", access_token(body)).await;
        assert_eq!(me.status, StatusCode::UNAUTHORIZED);
        let refresh = app
            .post("/api/auth/refresh", json!({"refresh_token": refresh_token(body)}))
            .await;
        assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
    }

    // A fresh login still works
    let again = app
        .post("/api/auth/login", json!({"email_or_username": "alice", "password": PASSWORD}))
        .await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(user_id(&again.body), user_id(&phone));
}
