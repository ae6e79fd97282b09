use std::sync::Arc;

use axum::http::Request;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::KeyExtractor, GovernorError, GovernorLayer,
};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::rate_limit::rate_limit_error_handler;

/// Keys the limiter on the authenticated user set by `auth_middleware`.
#[derive(Debug, Clone, Copy)]
pub struct UserIdExtractor;

impl KeyExtractor for UserIdExtractor {
    type Key = Uuid;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        req.extensions()
            .get::<AuthUser>()
            .map(|user| user.user_id)
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

pub type RoleGovernorLayer = GovernorLayer<
    UserIdExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Roles that get a per-user limiter. Admin routes are not mounted under one.
#[derive(Debug, Clone, Copy)]
pub enum RateLimitedRole {
    Customer,
    Mower,
}

/// - Mower: 500 requests per minute, burst 500
/// - Customer: 100 requests per minute, burst 100
///
/// Must sit inside `auth_middleware` so the `AuthUser` extension exists.
pub fn create_role_governor(role: RateLimitedRole) -> Option<RoleGovernorLayer> {
    let (per_ms, burst) = match role {
        RateLimitedRole::Mower => (120, 500),
        RateLimitedRole::Customer => (600, 100),
    };

    let config = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(burst)
        .key_extractor(UserIdExtractor)
        .finish()?;

    Some(GovernorLayer::new(Arc::new(config)).error_handler(rate_limit_error_handler))
}
