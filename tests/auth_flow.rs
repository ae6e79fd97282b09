mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;

use common::{account, send, spawn_app, TestApp};
use lawnconnect_api::entities::user;

async fn register(app: &TestApp, body: serde_json::Value) -> common::TestResponse {
    send(&app.router, Method::POST, "/api/v1/auth/register", None, Some(body)).await
}

fn registration(name: &str, email: &str, password: &str, role: &str) -> serde_json::Value {
    json!({ "name": name, "email": email, "password": password, "role": role })
}

async fn find_user(app: &TestApp, email: &str) -> user::Model {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&app.state.db)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn register_creates_an_unapproved_account() {
    let app = spawn_app().await;

    let response = register(
        &app,
        registration("Alex", " Alex@Example.com ", "secret123", "mower"),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["success"], true);
    let data = response.data();
    assert_eq!(data["email"], "alex@example.com");
    assert_eq!(data["role"], "mower");
    assert_eq!(data["isApproved"], false);
    assert!(data.get("passwordHash").is_none());
    assert!(data.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = spawn_app().await;
    let body = registration("Carol", "carol@example.com", "secret123", "customer");

    assert_eq!(register(&app, body.clone()).await.status, StatusCode::CREATED);

    let again = register(&app, body).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.kind(), "duplicate");
}

#[tokio::test]
async fn register_validates_its_input() {
    let app = spawn_app().await;

    let cases = [
        registration("Root", "root@example.com", "secret123", "admin"),
        registration("Carol", "carol@example.com", "secret123", "gardener"),
        registration("", "carol@example.com", "secret123", "customer"),
        registration("Carol", "not-an-email", "secret123", "customer"),
        registration("Carol", "carol@example.com", "123", "customer"),
    ];

    for body in cases {
        let response = register(&app, body.clone()).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response.kind(), "invalid_input");
    }
}

#[tokio::test]
async fn unparseable_body_is_a_bad_request() {
    let app = spawn_app().await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = common::send_request(&app.router, request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.kind(), "invalid_input");
}

#[tokio::test]
async fn login_returns_a_token_for_valid_credentials_only() {
    let app = spawn_app().await;
    let carol = account(&app, "Carol", "carol@example.com", "customer").await;
    assert!(!carol.token.is_empty());

    let claims = app.state.tokens.verify(&carol.token).unwrap();
    assert_eq!(claims.sub.to_string(), carol.id);

    let attempts = [
        ("carol@example.com", "wrong-password"),
        ("nobody@example.com", "secret123"),
    ];
    for (email, password) in attempts {
        let response = send(
            &app.router,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["message"], "Invalid email or password");
    }
}

#[tokio::test]
async fn forgot_password_always_succeeds() {
    let app = spawn_app().await;

    let response = send(
        &app.router,
        Method::POST,
        "/api/v1/auth/forgot-password",
        None,
        Some(json!({ "email": "nobody@example.com" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn password_can_be_reset_with_the_mailed_token() {
    let app = spawn_app().await;
    account(&app, "Carol", "carol@example.com", "customer").await;

    let response = send(
        &app.router,
        Method::POST,
        "/api/v1/auth/forgot-password",
        None,
        Some(json!({ "email": "carol@example.com" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let token = find_user(&app, "carol@example.com").await.reset_token.unwrap();
    let mail = app.mailer.sent_to("carol@example.com");
    assert_eq!(mail.len(), 1);
    assert!(mail[0].body.contains(&format!("reset-password?token={token}")));

    let reset = send(
        &app.router,
        Method::POST,
        "/api/v1/auth/reset-password",
        None,
        Some(json!({ "token": token, "newPassword": "new-secret" })),
    )
    .await;
    assert_eq!(reset.status, StatusCode::OK, "{}", reset.body);

    let login = send(
        &app.router,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "carol@example.com", "password": "new-secret" })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);

    // tokens are single use
    let replay = send(
        &app.router,
        Method::POST,
        "/api/v1/auth/reset-password",
        None,
        Some(json!({ "token": token, "newPassword": "another-secret" })),
    )
    .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert!(find_user(&app, "carol@example.com").await.reset_token.is_none());
}

#[tokio::test]
async fn expired_or_unknown_reset_tokens_are_rejected() {
    let app = spawn_app().await;
    account(&app, "Carol", "carol@example.com", "customer").await;

    let mut stale: user::ActiveModel = find_user(&app, "carol@example.com").await.into();
    stale.reset_token = Set(Some("stale-token".to_string()));
    stale.reset_token_expires_at = Set(Some((Utc::now() - Duration::minutes(1)).fixed_offset()));
    stale.update(&app.state.db).await.unwrap();

    for token in ["stale-token", "never-issued"] {
        let response = send(
            &app.router,
            Method::POST,
            "/api/v1/auth/reset-password",
            None,
            Some(json!({ "token": token, "newPassword": "new-secret" })),
        )
        .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["message"], "Invalid or expired token");
    }
}
