use async_trait::async_trait;
use derive_more::Display;
use serde::Serialize;

pub mod resend;

pub use resend::ResendMailer;

#[derive(Debug, Display, PartialEq)]
pub enum MailError {
    #[display("Email service is not configured")]
    NotConfigured,

    #[display("Email delivery failed: {_0}")]
    Delivery(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Stand-in used when no API key is configured. Every send reports
/// `NotConfigured` so the contact endpoint answers 503.
#[derive(Debug, Default, Clone)]
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::warn!(subject = %email.subject, "Dropping email, no mail provider configured");
        Err(MailError::NotConfigured)
    }
}
