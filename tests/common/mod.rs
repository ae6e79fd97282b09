#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use lawnconnect_api::config::Config;
use lawnconnect_api::notify::Mailer;
use lawnconnect_api::{db, routes, AppState};

// ── Mock Mailer ──

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, to: &str) -> Vec<SentEmail> {
        self.sent().into_iter().filter(|e| e.to == to).collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _html_body: &str) -> anyhow::Result<()> {
        anyhow::bail!("smtp relay unavailable")
    }
}

// ── Helpers ──

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_hours: 24,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        password_reset_url: "http://localhost:5173/reset-password".to_string(),
        reset_token_ttl_minutes: 60,
        payment_delay_ms: 0,
        rate_limit_enabled: false,
        smtp: None,
        admin_seed: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let state = state_with(config, mailer.clone()).await;
    TestApp {
        router: routes::create_router(state.clone()),
        state,
        mailer,
    }
}

pub async fn test_state(mailer: Arc<dyn Mailer>) -> AppState {
    state_with(test_config(), mailer).await
}

async fn state_with(config: Config, mailer: Arc<dyn Mailer>) -> AppState {
    let conn = db::connect(&config).await.unwrap();
    migration::Migrator::up(&conn, None).await.unwrap();
    AppState::new(conn, config, mailer)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn kind(&self) -> &str {
        self.body["error"]["kind"].as_str().unwrap_or_default()
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    send_request(router, request).await
}

pub async fn send_request(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse { status, body }
}

pub struct Account {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl Account {
    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).unwrap()
    }
}

/// Register through the API and log in
pub async fn account(app: &TestApp, name: &str, email: &str, role: &str) -> Account {
    let register = send(
        &app.router,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": "secret123", "role": role })),
    )
    .await;
    assert_eq!(register.status, StatusCode::CREATED, "{}", register.body);

    let login = send(
        &app.router,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK, "{}", login.body);

    Account {
        id: login.data()["user"]["id"].as_str().unwrap().to_string(),
        email: email.to_string(),
        token: login.data()["token"].as_str().unwrap().to_string(),
    }
}

pub async fn create_booking(app: &TestApp, customer: &Account) -> String {
    let response = send(
        &app.router,
        Method::POST,
        "/api/v1/bookings",
        Some(&customer.token),
        Some(json!({
            "date": "2024-05-01",
            "time": "10:00",
            "address": "1 Main St",
            "description": "Front and back lawn"
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.data()["id"].as_str().unwrap().to_string()
}
