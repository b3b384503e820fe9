use std::time::Duration;

use async_trait::async_trait;
use derive_more::Display;
use reqwest::Client;
use zeroize::Zeroizing;

/// Pages refreshed when a caller does not name any.
pub const DEFAULT_PATHS: [&str; 2] = ["/", "/portfolio"];

pub const REVALIDATE_TOKEN_HEADER: &str = "x-revalidate-token";

#[derive(Debug, Display)]
pub enum InvalidationError {
    #[display("Cache invalidation request failed: {_0}")]
    Request(String),

    #[display("Cache invalidation rejected with status {_0}")]
    Rejected(u16),
}

/// Signals the page renderer that public pages are stale.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, paths: &[String]) -> Result<(), InvalidationError>;
}

pub fn default_paths() -> Vec<String> {
    DEFAULT_PATHS.iter().map(|p| p.to_string()).collect()
}

/// Fires the signal for the default paths and only logs failures. Used after
/// content mutations, which must not fail because the renderer is down.
pub async fn invalidate_best_effort(invalidator: &dyn CacheInvalidator) {
    if let Err(e) = invalidator.invalidate(&default_paths()).await {
        tracing::warn!(error = %e, "Cache invalidation failed");
    }
}

/// POSTs `{"paths": [...]}` to the renderer's revalidation hook.
pub struct WebhookInvalidator {
    client: Client,
    url: String,
    token: Option<Zeroizing<String>>,
}

impl WebhookInvalidator {
    pub fn new(url: &str, token: Option<&str>) -> Result<Self, InvalidationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| InvalidationError::Request(e.to_string()))?;

        Ok(WebhookInvalidator {
            client,
            url: url.to_string(),
            token: token.map(|t| Zeroizing::new(t.to_string())),
        })
    }
}

#[async_trait]
impl CacheInvalidator for WebhookInvalidator {
    async fn invalidate(&self, paths: &[String]) -> Result<(), InvalidationError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "paths": paths }));

        if let Some(token) = &self.token {
            request = request.header(REVALIDATE_TOKEN_HEADER, token.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| InvalidationError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(InvalidationError::Rejected(response.status().as_u16()));
        }

        tracing::info!(?paths, "Cache invalidated");
        Ok(())
    }
}

/// Used when no renderer hook is configured.
#[derive(Debug, Default, Clone)]
pub struct LogOnlyInvalidator;

#[async_trait]
impl CacheInvalidator for LogOnlyInvalidator {
    async fn invalidate(&self, paths: &[String]) -> Result<(), InvalidationError> {
        tracing::info!(?paths, "Cache invalidation requested (no renderer hook configured)");
        Ok(())
    }
}
