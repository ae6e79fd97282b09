pub mod smtp;
pub mod templates;

use async_trait::async_trait;

pub use smtp::SmtpMailer;
pub use templates::Email;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()>;
}

/// Writes outgoing mail to the log instead of delivering it. Used when no
/// SMTP relay is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        tracing::info!(to = %to, subject = %subject, body = %html_body, "email (not delivered)");
        Ok(())
    }
}

/// Sends `email` and swallows the failure. State changes that trigger mail are
/// already committed by the time this runs.
pub async fn deliver(mailer: &dyn Mailer, to: &str, email: Email) {
    match mailer.send(to, &email.subject, &email.html).await {
        Ok(()) => tracing::debug!(to = %to, subject = %email.subject, "email sent"),
        Err(err) => tracing::warn!(
            to = %to,
            subject = %email.subject,
            error = %err,
            "email delivery failed"
        ),
    }
}
