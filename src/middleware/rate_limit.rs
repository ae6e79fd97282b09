use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorError, GovernorLayer};

use crate::error::AppError;

/// Type alias for the public governor layer (IP-based rate limiting)
pub type PublicGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// Per-IP limiter for the unauthenticated auth endpoints.
/// - 100 requests per minute (one token every 600ms)
///
/// Keyed on the peer address, so the server must be started with
/// `into_make_service_with_connect_info`.
pub fn create_public_governor() -> Option<PublicGovernorLayer> {
    let config = GovernorConfigBuilder::default()
        .per_millisecond(600)
        .burst_size(100)
        .finish()?;

    Some(GovernorLayer::new(Arc::new(config)).error_handler(rate_limit_error_handler))
}

/// Renders limiter rejections in the standard response envelope.
pub fn rate_limit_error_handler(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { wait_time, headers } => {
            tracing::warn!(wait_time, "request rate limited");
            let mut response = AppError::RateLimited(format!(
                "Too many requests, retry in {} seconds",
                wait_time
            ))
            .into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
        GovernorError::UnableToExtractKey => {
            AppError::Internal("rate limiter could not extract a key".to_string()).into_response()
        }
        GovernorError::Other { code, msg, .. } => {
            tracing::warn!(code = %code, msg = ?msg, "rate limiter error");
            AppError::Internal(format!("rate limiter error: {:?}", msg)).into_response()
        }
    }
}

/// Middleware to log request outcomes with the client address
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!(client_ip = %addr.ip(), method = %method, uri = %uri, "rate limited");
    } else if status.is_client_error() || status.is_server_error() {
        tracing::warn!(
            client_ip = %addr.ip(),
            method = %method,
            uri = %uri,
            status = %status,
            "request failed"
        );
    } else {
        tracing::debug!(
            client_ip = %addr.ip(),
            method = %method,
            uri = %uri,
            status = %status,
            "request completed"
        );
    }

    response
}
