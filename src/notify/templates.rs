use crate::entities::booking;

#[derive(Debug, Clone)]
pub struct Email {
    pub subject: String,
    pub html: String,
}

fn layout(heading: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #2f855a;">{heading}</h2>
        {body}
        <p style="color: #666; font-size: 12px; margin-top: 40px;">LawnConnect</p>
    </div>
</body>
</html>"#
    )
}

fn schedule(booking: &booking::Model) -> String {
    format!(
        "<p><strong>{} at {}</strong><br>{}</p>",
        booking.date, booking.time, booking.address
    )
}

pub fn password_reset(name: &str, reset_url: &str, ttl_minutes: i64) -> Email {
    Email {
        subject: "Password Reset Request".to_string(),
        html: layout(
            "Reset your password",
            &format!(
                "<p>Hi {name},</p>\
                 <p>Use the link below to choose a new password. \
                 It expires in {ttl_minutes} minutes.</p>\
                 <p><a href=\"{reset_url}\">{reset_url}</a></p>\
                 <p>If you didn't request this, you can ignore this email.</p>"
            ),
        ),
    }
}

pub fn booking_accepted(customer_name: &str, mower_name: &str, booking: &booking::Model) -> Email {
    Email {
        subject: "Your booking has been accepted".to_string(),
        html: layout(
            "Booking accepted",
            &format!(
                "<p>Hi {customer_name},</p><p>{mower_name} will take care of your booking:</p>{}",
                schedule(booking)
            ),
        ),
    }
}

pub fn booking_rejected(customer_name: &str, booking: &booking::Model) -> Email {
    Email {
        subject: "Your booking was declined".to_string(),
        html: layout(
            "Booking declined",
            &format!(
                "<p>Hi {customer_name},</p><p>Your booking could not be taken on:</p>{}\
                 <p>You can create a new booking at any time.</p>",
                schedule(booking)
            ),
        ),
    }
}

pub fn booking_completed(customer_name: &str, booking: &booking::Model) -> Email {
    Email {
        subject: "Your booking is complete".to_string(),
        html: layout(
            "Job complete",
            &format!(
                "<p>Hi {customer_name},</p><p>The job below is done and a payment of \
                 <strong>{:.2}</strong> has been recorded.</p>{}",
                booking.price,
                schedule(booking)
            ),
        ),
    }
}

pub fn booking_cancelled(mower_name: &str, booking: &booking::Model) -> Email {
    Email {
        subject: "A booking was cancelled".to_string(),
        html: layout(
            "Booking cancelled",
            &format!(
                "<p>Hi {mower_name},</p><p>The customer cancelled this booking:</p>{}",
                schedule(booking)
            ),
        ),
    }
}
