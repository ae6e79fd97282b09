use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    prelude::DateTimeWithTimeZone, ActiveModelTrait, ColumnTrait, Condition, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::booking::{self, BillingStatus, BookingStatus};
use crate::entities::user;
use crate::error::{AppError, AppResult};
use crate::lifecycle::{self, Action, Decision};
use crate::notify::{self, templates, Email};
use crate::AppState;

pub struct NewBooking {
    pub date: String,
    pub time: String,
    pub address: String,
    pub description: Option<String>,
}

fn now() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

fn validate(input: &NewBooking) -> AppResult<()> {
    if input.date.trim().is_empty()
        || input.time.trim().is_empty()
        || input.address.trim().is_empty()
    {
        return Err(AppError::InvalidInput(
            "Date, time, and address are required".to_string(),
        ));
    }
    if NaiveDate::parse_from_str(input.date.trim(), "%Y-%m-%d").is_err() {
        return Err(AppError::InvalidInput(
            "Date must be in YYYY-MM-DD format".to_string(),
        ));
    }
    // chrono accepts single-digit hours, the stored form is always HH:MM
    let time = input.time.trim();
    if time.len() != 5 || NaiveTime::parse_from_str(time, "%H:%M").is_err() {
        return Err(AppError::InvalidInput(
            "Time must be in HH:MM format".to_string(),
        ));
    }
    Ok(())
}

pub async fn create(
    state: &AppState,
    customer_id: Uuid,
    input: NewBooking,
) -> AppResult<booking::Model> {
    validate(&input)?;

    let now = now();
    let new_booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer_id),
        mower_id: Set(None),
        date: Set(input.date.trim().to_string()),
        time: Set(input.time.trim().to_string()),
        address: Set(input.address.trim().to_string()),
        description: Set(input.description.unwrap_or_default()),
        status: Set(BookingStatus::Pending),
        price: Set(0.0),
        billing_status: Set(BillingStatus::Pending),
        accepted_at: Set(None),
        completed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let booking = new_booking.insert(&state.db).await?;
    tracing::info!(booking_id = %booking.id, customer_id = %customer_id, "booking created");
    Ok(booking)
}

pub async fn get(state: &AppState, booking_id: Uuid) -> AppResult<booking::Model> {
    booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

/// Bookings where the user is the customer or the assigned mower
pub async fn list_for_user(state: &AppState, user_id: Uuid) -> AppResult<Vec<booking::Model>> {
    Ok(booking::Entity::find()
        .filter(
            Condition::any()
                .add(booking::Column::CustomerId.eq(user_id))
                .add(booking::Column::MowerId.eq(user_id)),
        )
        .order_by_asc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?)
}

pub async fn list_pending(state: &AppState) -> AppResult<Vec<booking::Model>> {
    Ok(booking::Entity::find()
        .filter(booking::Column::Status.eq(BookingStatus::Pending))
        .order_by_asc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?)
}

pub async fn accept(
    state: &AppState,
    booking_id: Uuid,
    mower_id: Uuid,
) -> AppResult<booking::Model> {
    let action = Action::Accept { mower_id };
    let current = get(state, booking_id).await?;
    if lifecycle::decide(&current, &action)? == Decision::AlreadyApplied {
        return Ok(current);
    }

    let now = now();
    let patch = booking::ActiveModel {
        status: Set(BookingStatus::Accepted),
        mower_id: Set(Some(mower_id)),
        accepted_at: Set(Some(now)),
        updated_at: Set(now),
        ..Default::default()
    };
    let updated = match write(state, &current, &action, patch).await? {
        Written::Applied(booking) => booking,
        // a concurrent request from the same mower got there first
        Written::AlreadyApplied(booking) => return Ok(booking),
    };
    tracing::info!(booking_id = %booking_id, mower_id = %mower_id, "booking accepted");

    if let Some(customer) = find_user(state, updated.customer_id).await {
        let mower_name = find_user(state, mower_id)
            .await
            .map(|mower| mower.name)
            .unwrap_or_else(|| "your mower".to_string());
        let email = templates::booking_accepted(&customer.name, &mower_name, &updated);
        send(state, &customer, email).await;
    }

    Ok(updated)
}

pub async fn reject(
    state: &AppState,
    booking_id: Uuid,
    mower_id: Uuid,
) -> AppResult<booking::Model> {
    let action = Action::Reject { mower_id };
    let current = get(state, booking_id).await?;
    lifecycle::decide(&current, &action)?;

    let patch = booking::ActiveModel {
        status: Set(BookingStatus::Rejected),
        updated_at: Set(now()),
        ..Default::default()
    };
    let updated = write(state, &current, &action, patch).await?.into_model();
    tracing::info!(booking_id = %booking_id, mower_id = %mower_id, "booking rejected");

    if let Some(customer) = find_user(state, updated.customer_id).await {
        send(state, &customer, templates::booking_rejected(&customer.name, &updated)).await;
    }

    Ok(updated)
}

/// Complete an accepted booking and take the simulated payment.
///
/// The payment delay runs inside the request future, so a client that
/// disconnects during it leaves the booking accepted.
pub async fn complete(
    state: &AppState,
    booking_id: Uuid,
    mower_id: Uuid,
    price: f64,
) -> AppResult<booking::Model> {
    let action = Action::Complete { mower_id, price };
    lifecycle::validate_price(price)?;
    let current = get(state, booking_id).await?;
    lifecycle::decide(&current, &action)?;

    simulate_payment(state, booking_id, price).await;

    let now = now();
    let patch = booking::ActiveModel {
        status: Set(BookingStatus::Completed),
        price: Set(price),
        billing_status: Set(BillingStatus::Paid),
        completed_at: Set(Some(now)),
        updated_at: Set(now),
        ..Default::default()
    };
    let updated = write(state, &current, &action, patch).await?.into_model();
    tracing::info!(booking_id = %booking_id, mower_id = %mower_id, price, "booking completed");

    if let Some(customer) = find_user(state, updated.customer_id).await {
        send(state, &customer, templates::booking_completed(&customer.name, &updated)).await;
    }

    Ok(updated)
}

pub async fn cancel(
    state: &AppState,
    booking_id: Uuid,
    customer_id: Uuid,
) -> AppResult<booking::Model> {
    let action = Action::Cancel { customer_id };
    let current = get(state, booking_id).await?;
    lifecycle::decide(&current, &action)?;

    let patch = booking::ActiveModel {
        status: Set(BookingStatus::Cancelled),
        mower_id: Set(None),
        updated_at: Set(now()),
        ..Default::default()
    };
    let updated = write(state, &current, &action, patch).await?.into_model();
    tracing::info!(booking_id = %booking_id, customer_id = %customer_id, "booking cancelled");

    if let Some(released) = current.mower_id {
        if let Some(mower) = find_user(state, released).await {
            send(state, &mower, templates::booking_cancelled(&mower.name, &updated)).await;
        }
    }

    Ok(updated)
}

async fn simulate_payment(state: &AppState, booking_id: Uuid, price: f64) {
    tracing::debug!(booking_id = %booking_id, price, "processing payment");
    tokio::time::sleep(Duration::from_millis(state.config.payment_delay_ms)).await;
}

enum Written {
    /// This request moved the booking.
    Applied(booking::Model),
    /// A concurrent request already made the same change.
    AlreadyApplied(booking::Model),
}

impl Written {
    fn into_model(self) -> booking::Model {
        match self {
            Written::Applied(booking) | Written::AlreadyApplied(booking) => booking,
        }
    }
}

/// Persist a transition with a conditional update that only matches the
/// snapshot `decide` approved. If another request changed the booking in
/// between, nothing is written and the new state is judged again: the
/// same change made by someone else is reported as `AlreadyApplied`,
/// anything else as the error the new state implies.
async fn write(
    state: &AppState,
    current: &booking::Model,
    action: &Action,
    patch: booking::ActiveModel,
) -> AppResult<Written> {
    let mower_matches = match current.mower_id {
        Some(mower_id) => booking::Column::MowerId.eq(mower_id),
        None => booking::Column::MowerId.is_null(),
    };

    let result = booking::Entity::update_many()
        .set(patch)
        .filter(booking::Column::Id.eq(current.id))
        .filter(booking::Column::Status.eq(current.status))
        .filter(mower_matches)
        .exec(&state.db)
        .await?;

    let latest = get(state, current.id).await?;
    debug_assert_eq!(latest.mower_id.is_some(), latest.status.has_mower());

    if result.rows_affected == 0 {
        tracing::info!(
            booking_id = %current.id,
            status = latest.status.as_str(),
            "lost transition race"
        );
        return match lifecycle::decide(&latest, action)? {
            Decision::AlreadyApplied => Ok(Written::AlreadyApplied(latest)),
            Decision::Apply(_) => Err(AppError::Conflict(
                "Booking was modified by another request, please retry".to_string(),
            )),
        };
    }

    Ok(Written::Applied(latest))
}

async fn find_user(state: &AppState, user_id: Uuid) -> Option<user::Model> {
    match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!(
                user_id = %user_id,
                error = %err,
                "could not load notification recipient"
            );
            None
        }
    }
}

async fn send(state: &AppState, recipient: &user::Model, email: Email) {
    notify::deliver(state.mailer.as_ref(), &recipient.email, email).await;
}
