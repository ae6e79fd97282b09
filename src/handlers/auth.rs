use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::services::auth::{self as auth_service, Registration};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            is_verified: u.is_verified,
            is_approved: u.is_approved,
            phone_number: u.phone_number,
            created_at: u.created_at.with_timezone(&Utc),
            updated_at: u.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
}

fn parse_role(role: &str) -> AppResult<UserRole> {
    match role.trim() {
        "customer" => Ok(UserRole::Customer),
        "mower" => Ok(UserRole::Mower),
        _ => Err(AppError::InvalidInput(
            "Role must be either customer or mower".to_string(),
        )),
    }
}

/// Register a new customer or mower account
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let Json(payload) = payload?;

    let user = auth_service::register(
        &state,
        Registration {
            role: parse_role(&payload.role)?,
            name: payload.name,
            email: payload.email,
            password: payload.password,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "User registered successfully",
            user.into(),
        )),
    ))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let Json(payload) = payload?;
    let (user, token) = auth_service::login(&state, &payload.email, &payload.password).await?;

    Ok(Json(ApiResponse::success(
        "Login successful",
        LoginResponse {
            user: user.into(),
            token,
        },
    )))
}

/// Request a password reset link
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<()>>> {
    let Json(payload) = payload?;
    auth_service::forgot_password(&state, &payload.email).await?;

    Ok(Json(ApiResponse::message(
        "If an account exists with that email, a password reset link has been sent",
    )))
}

/// Set a new password using a reset token
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<()>>> {
    let Json(payload) = payload?;
    auth_service::reset_password(&state, &payload.token, &payload.new_password).await?;

    Ok(Json(ApiResponse::message("Password has been reset successfully")))
}
