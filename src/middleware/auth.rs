use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::{TypedHeaderRejection, TypedHeaderRejectionReason},
    TypedHeader,
};
use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Verified caller identity, attached to the request by `auth_middleware`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

pub const CUSTOMER: &[UserRole] = &[UserRole::Customer];
pub const MOWER: &[UserRole] = &[UserRole::Mower];
pub const CUSTOMER_OR_MOWER: &[UserRole] = &[UserRole::Customer, UserRole::Mower];

/// Extract and validate the bearer token from the Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    auth: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let TypedHeader(auth) = auth.map_err(|rejection| match rejection.reason() {
        TypedHeaderRejectionReason::Missing => {
            AppError::Unauthenticated("Authorization header is missing".to_string())
        }
        _ => AppError::Unauthenticated(
            "Authorization header must be 'Bearer <token>'".to_string(),
        ),
    })?;

    let claims = state.tokens.verify(auth.token())?;
    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Allow the request through only when the caller holds one of `allowed`.
/// Mounted with `from_fn_with_state(CUSTOMER, require_role)` and friends.
pub async fn require_role(
    State(allowed): State<&'static [UserRole]>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Unauthenticated("No authentication found".to_string()))?;

    if !allowed.contains(&user.role) {
        tracing::debug!(
            user_id = %user.user_id,
            role = user.role.as_str(),
            "role gate refused request"
        );
        return Err(AppError::Forbidden(
            "Access denied: insufficient privileges".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
