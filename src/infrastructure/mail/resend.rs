use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use zeroize::Zeroizing;

use super::{MailError, Mailer, OutgoingEmail};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

pub struct ResendMailer {
    client: Client,
    endpoint: String,
    api_key: Zeroizing<String>,
}

impl ResendMailer {
    pub fn new(api_key: &str) -> Result<Self, MailError> {
        Self::with_endpoint(api_key, RESEND_ENDPOINT)
    }

    pub fn with_endpoint(api_key: &str, endpoint: &str) -> Result<Self, MailError> {
        if api_key.trim().is_empty() {
            return Err(MailError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        Ok(ResendMailer {
            client,
            endpoint: endpoint.to_string(),
            api_key: Zeroizing::new(api_key.to_string()),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[tracing::instrument(skip(self, email), fields(subject = %email.subject))]
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.as_str())
            .json(email)
            .send()
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                tracing::info!("Email accepted by provider");
                Ok(())
            }
            // Resend answers 401/403 for missing or revoked keys
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::error!(status = %response.status(), "Email provider rejected the API key");
                Err(MailError::NotConfigured)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(MailError::Delivery(format!("{status}: {body}")))
            }
        }
    }
}
