use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BillingStatus, BookingStatus};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::services::bookings::{self as booking_service, NewBooking};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub address: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteBookingRequest {
    pub price: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mower_id: Option<Uuid>,
    pub date: String,
    pub time: String,
    pub address: String,
    pub description: String,
    pub status: BookingStatus,
    pub price: f64,
    pub billing_status: BillingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<booking::Model> for BookingResponse {
    fn from(b: booking::Model) -> Self {
        Self {
            id: b.id,
            customer_id: b.customer_id,
            mower_id: b.mower_id,
            date: b.date,
            time: b.time,
            address: b.address,
            description: b.description,
            status: b.status,
            price: b.price,
            billing_status: b.billing_status,
            accepted_time: b.accepted_at.map(|t| t.with_timezone(&Utc)),
            completed_time: b.completed_at.map(|t| t.with_timezone(&Utc)),
            created_at: b.created_at.with_timezone(&Utc),
            updated_at: b.updated_at.with_timezone(&Utc),
        }
    }
}

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput("Invalid booking ID".to_string()))
}

fn many(bookings: Vec<booking::Model>) -> Vec<BookingResponse> {
    bookings.into_iter().map(BookingResponse::from).collect()
}

/// Create a booking for the calling customer
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<BookingResponse>>)> {
    let Json(payload) = payload?;

    let booking = booking_service::create(
        &state,
        user.user_id,
        NewBooking {
            date: payload.date,
            time: payload.time,
            address: payload.address,
            description: payload.description,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Booking created successfully",
            booking.into(),
        )),
    ))
}

/// List bookings the caller takes part in
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<Vec<BookingResponse>>>> {
    let bookings = booking_service::list_for_user(&state, user.user_id).await?;
    Ok(Json(ApiResponse::success(
        "Bookings retrieved successfully",
        many(bookings),
    )))
}

/// List bookings waiting for a mower
pub async fn pending_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<BookingResponse>>>> {
    let bookings = booking_service::list_pending(&state).await?;
    Ok(Json(ApiResponse::success(
        "Pending bookings retrieved successfully",
        many(bookings),
    )))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> AppResult<Json<ApiResponse<BookingResponse>>> {
    let booking = booking_service::get(&state, parse_id(&booking_id)?).await?;
    Ok(Json(ApiResponse::success(
        "Booking retrieved successfully",
        booking.into(),
    )))
}

pub async fn accept_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<String>,
) -> AppResult<Json<ApiResponse<BookingResponse>>> {
    let booking = booking_service::accept(&state, parse_id(&booking_id)?, user.user_id).await?;
    Ok(Json(ApiResponse::success(
        "Booking accepted successfully",
        booking.into(),
    )))
}

pub async fn reject_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<String>,
) -> AppResult<Json<ApiResponse<BookingResponse>>> {
    let booking = booking_service::reject(&state, parse_id(&booking_id)?, user.user_id).await?;
    Ok(Json(ApiResponse::success(
        "Booking rejected successfully",
        booking.into(),
    )))
}

/// Complete an accepted booking and charge `price`
pub async fn complete_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<String>,
    payload: Result<Json<CompleteBookingRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<BookingResponse>>> {
    let booking_id = parse_id(&booking_id)?;
    let Json(payload) = payload?;

    let booking =
        booking_service::complete(&state, booking_id, user.user_id, payload.price).await?;
    Ok(Json(ApiResponse::success(
        "Booking completed and payment processed",
        booking.into(),
    )))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(booking_id): Path<String>,
) -> AppResult<Json<ApiResponse<BookingResponse>>> {
    let booking = booking_service::cancel(&state, parse_id(&booking_id)?, user.user_id).await?;
    Ok(Json(ApiResponse::success(
        "Booking cancelled successfully",
        booking.into(),
    )))
}
