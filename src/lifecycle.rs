//! Booking status transitions and who may trigger them.
//!
//! ```text
//! pending  -> accepted   any mower (becomes the assigned mower)
//! pending  -> rejected   any mower not assigned elsewhere
//! pending  -> cancelled  owning customer
//! accepted -> completed  assigned mower, price > 0
//! accepted -> cancelled  owning customer
//! ```
//!
//! `completed`, `cancelled` and `rejected` are terminal. The rules here only
//! look at a booking snapshot; persisting the result is done by
//! `services::bookings`, which repeats the guard in its conditional update.

use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Accept { mower_id: Uuid },
    Reject { mower_id: Uuid },
    Complete { mower_id: Uuid, price: f64 },
    Cancel { customer_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Move the booking to the given status.
    Apply(BookingStatus),
    /// The booking is already where the action would put it.
    AlreadyApplied,
}

pub fn is_allowed(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    matches!(
        (from, to),
        (Pending, Accepted)
            | (Pending, Rejected)
            | (Pending, Cancelled)
            | (Accepted, Completed)
            | (Accepted, Cancelled)
    )
}

pub fn validate_price(price: f64) -> AppResult<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::InvalidInput(
            "Price must be a positive number".to_string(),
        ));
    }
    Ok(())
}

pub fn decide(booking: &booking::Model, action: &Action) -> AppResult<Decision> {
    let next = match *action {
        Action::Accept { mower_id } => {
            ensure_not_taken(booking, mower_id)?;
            if booking.mower_id == Some(mower_id) && booking.status == BookingStatus::Accepted {
                return Ok(Decision::AlreadyApplied);
            }
            ensure_status(booking, BookingStatus::Pending, "accepted")?;
            BookingStatus::Accepted
        }
        Action::Reject { mower_id } => {
            ensure_not_taken(booking, mower_id)?;
            ensure_status(booking, BookingStatus::Pending, "rejected")?;
            BookingStatus::Rejected
        }
        Action::Complete { mower_id, price } => {
            validate_price(price)?;
            ensure_status(booking, BookingStatus::Accepted, "completed")?;
            if booking.mower_id != Some(mower_id) {
                return Err(AppError::Forbidden(
                    "Only the assigned mower can complete this booking".to_string(),
                ));
            }
            BookingStatus::Completed
        }
        Action::Cancel { customer_id } => {
            if booking.customer_id != customer_id {
                return Err(AppError::Forbidden(
                    "Unauthorized to cancel this booking".to_string(),
                ));
            }
            if booking.status.is_terminal() {
                return Err(AppError::InvalidState(format!(
                    "Booking is already {}",
                    booking.status.as_str()
                )));
            }
            if !matches!(
                booking.status,
                BookingStatus::Pending | BookingStatus::Accepted
            ) {
                return Err(AppError::InvalidState(
                    "Booking cannot be cancelled in its current state".to_string(),
                ));
            }
            BookingStatus::Cancelled
        }
    };

    debug_assert!(
        is_allowed(booking.status, next),
        "{} -> {} is not a lifecycle edge",
        booking.status.as_str(),
        next.as_str()
    );
    Ok(Decision::Apply(next))
}

fn ensure_not_taken(booking: &booking::Model, mower_id: Uuid) -> AppResult<()> {
    match booking.mower_id {
        Some(assigned) if assigned != mower_id => Err(AppError::Conflict(
            "This booking has already been accepted by another mower".to_string(),
        )),
        _ => Ok(()),
    }
}

fn ensure_status(booking: &booking::Model, expected: BookingStatus, verb: &str) -> AppResult<()> {
    if booking.status != expected {
        return Err(AppError::InvalidState(format!(
            "Booking is {} and cannot be {}",
            booking.status.as_str(),
            verb
        )));
    }
    Ok(())
}
