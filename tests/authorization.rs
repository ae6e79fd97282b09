mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Duration, Utc};
use uuid::Uuid;

use common::{account, create_booking, send, send_request, spawn_app};
use lawnconnect_api::entities::user::UserRole;
use lawnconnect_api::utils::jwt::TokenIssuer;

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;

    let response = send(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
}

#[tokio::test]
async fn unknown_routes_use_the_envelope() {
    let app = spawn_app().await;

    let response = send(&app.router, Method::GET, "/api/v1/lawns", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.kind(), "not_found");
}

#[tokio::test]
async fn missing_header_is_unauthenticated() {
    let app = spawn_app().await;

    let response = send(&app.router, Method::GET, "/api/v1/bookings", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.kind(), "unauthenticated");
    assert_eq!(response.body["message"], "Authorization header is missing");
}

#[tokio::test]
async fn non_bearer_header_is_unauthenticated() {
    let app = spawn_app().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/bookings")
        .header(header::AUTHORIZATION, "Basic Y2Fyb2w6c2VjcmV0")
        .body(Body::empty())
        .unwrap();
    let response = send_request(&app.router, request).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.kind(), "unauthenticated");
}

#[tokio::test]
async fn bad_tokens_are_unauthenticated() {
    let app = spawn_app().await;
    let user_id = Uuid::new_v4();

    let forged = TokenIssuer::new("some-other-secret", 24)
        .issue(user_id, UserRole::Mower)
        .unwrap();
    let expired = app
        .state
        .tokens
        .issue_at(user_id, UserRole::Mower, Utc::now() - Duration::hours(25))
        .unwrap();

    let uri = "/api/v1/bookings/pending";
    for token in [forged.as_str(), expired.as_str(), "garbage"] {
        let response = send(&app.router, Method::GET, uri, Some(token), None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{token}");
        assert_eq!(response.kind(), "unauthenticated");
    }
}

#[tokio::test]
async fn roles_are_enforced_per_route_group() {
    let app = spawn_app().await;
    let customer = account(&app, "Carol", "carol@example.com", "customer").await;
    let mower = account(&app, "Alex", "alex@example.com", "mower").await;
    let id = create_booking(&app, &customer).await;

    let forbidden = [
        (Method::GET, "/api/v1/bookings/pending".to_string(), &customer.token),
        (Method::PUT, format!("/api/v1/bookings/{id}/accept"), &customer.token),
        (Method::PUT, format!("/api/v1/bookings/{id}/reject"), &customer.token),
        (Method::PUT, format!("/api/v1/bookings/{id}/cancel"), &mower.token),
        (Method::POST, "/api/v1/bookings".to_string(), &mower.token),
    ];

    for (method, uri, token) in forbidden {
        let response = send(&app.router, method.clone(), &uri, Some(token), None).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(response.kind(), "forbidden");
    }
}

#[tokio::test]
async fn admin_tokens_do_not_reach_booking_routes() {
    let app = spawn_app().await;
    let admin = app.state.tokens.issue(Uuid::new_v4(), UserRole::Admin).unwrap();

    let response = send(&app.router, Method::GET, "/api/v1/bookings", Some(&admin), None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
