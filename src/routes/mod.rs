use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{auth, bookings, health};
use crate::middleware::auth::{auth_middleware, require_role, CUSTOMER, CUSTOMER_OR_MOWER, MOWER};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let limited = state.config.rate_limit_enabled;

    // Public routes (per-IP rate limiting)
    let mut auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password));
    if let Some(governor) = create_public_governor().filter(|_| limited) {
        auth_routes = auth_routes.layer(governor);
    }

    // Customer routes (requires auth + customer role)
    let mut customer_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route("/{id}/cancel", put(bookings::cancel_booking));
    if let Some(governor) = create_role_governor(RateLimitedRole::Customer).filter(|_| limited) {
        customer_routes = customer_routes.layer(governor);
    }
    let customer_routes = customer_routes
        .layer(middleware::from_fn_with_state(CUSTOMER, require_role))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Mower routes (requires auth + mower role)
    let mut mower_routes = Router::new()
        .route("/pending", get(bookings::pending_bookings))
        .route("/{id}/accept", put(bookings::accept_booking))
        .route("/{id}/reject", put(bookings::reject_booking))
        .route("/{id}/complete", put(bookings::complete_booking));
    if let Some(governor) = create_role_governor(RateLimitedRole::Mower).filter(|_| limited) {
        mower_routes = mower_routes.layer(governor);
    }
    let mower_routes = mower_routes
        .layer(middleware::from_fn_with_state(MOWER, require_role))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Routes open to both sides of a booking
    let participant_routes = Router::new()
        .route("/", get(bookings::my_bookings))
        .route("/{id}", get(bookings::get_booking))
        .layer(middleware::from_fn_with_state(CUSTOMER_OR_MOWER, require_role))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let booking_routes = Router::new()
        .merge(customer_routes)
        .merge(mower_routes)
        .merge(participant_routes);

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/bookings", booking_routes);

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .fallback(health::not_found)
        .with_state(state)
}
