//! Digest delivery through an email provider.
//!
//! [`DigestSender`] is the seam between the pipeline and whatever sends the mail.
//! [`ResendSender`] implements it with Resend broadcasts: the digest is created as a
//! broadcast addressed to an audience segment, then sent.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::digest::Digest;
use crate::util::{is_localhost, validate_url};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The provider rejected the request
    #[error("Provider returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
    #[error("Missing delivery setting: {0}")]
    MissingSetting(&'static str),
}

/// Something that can deliver a rendered digest to its audience.
#[async_trait]
pub trait DigestSender: Send + Sync {
    /// Delivers `digest`, returning the provider's identifier for the delivery.
    async fn send(&self, digest: &Digest) -> Result<String, DeliveryError>;
}

/// Resend broadcast client.
pub struct ResendSender {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    segment_id: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct CreateBroadcast<'a> {
    segment_id: &'a str,
    from: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct BroadcastCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: Option<String>,
}

impl ResendSender {
    /// Creates a sender for `base_url`.
    ///
    /// The API key is only ever sent over HTTPS; plain HTTP is accepted for
    /// localhost so tests can point the sender at a mock server.
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        segment_id: String,
        from: String,
    ) -> Result<Self, DeliveryError> {
        let parsed =
            validate_url(base_url).map_err(|e| DeliveryError::InvalidUrl(e.to_string()))?;
        if parsed.scheme() != "https" {
            if !is_localhost(&parsed) {
                tracing::error!(base_url = %base_url, "Rejecting non-HTTPS provider URL");
                return Err(DeliveryError::InsecureBaseUrl);
            }
            tracing::warn!(base_url = %base_url, "Using non-HTTPS provider URL (localhost only)");
        }

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            segment_id,
            from,
        })
    }

    /// Creates a sender from the `[delivery]` section and its environment overrides.
    pub fn from_config(config: &Config) -> Result<Self, DeliveryError> {
        let api_key = config
            .api_key()
            .ok_or(DeliveryError::MissingSetting("api_key"))?;
        let segment_id = config
            .segment_id()
            .ok_or(DeliveryError::MissingSetting("segment_id"))?;

        Self::new(
            &config.delivery.base_url,
            api_key,
            segment_id,
            config.delivery.from.clone(),
        )
    }

    async fn create_broadcast(&self, digest: &Digest) -> Result<String, DeliveryError> {
        let body = CreateBroadcast {
            segment_id: &self.segment_id,
            from: &self.from,
            subject: &digest.subject,
            html: &digest.html,
        };

        let response = self
            .client
            .post(format!("{}/broadcasts", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let created: BroadcastCreated = response.json().await?;
        Ok(created.id)
    }

    async fn send_broadcast(&self, id: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(format!("{}/broadcasts/{}/send", self.base_url, id))
            .bearer_auth(self.api_key.expose_secret())
            .json(&serde_json::json!({}))
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DigestSender for ResendSender {
    async fn send(&self, digest: &Digest) -> Result<String, DeliveryError> {
        let id = self.create_broadcast(digest).await?;
        tracing::info!(broadcast_id = %id, items = digest.items.len(), "Created broadcast");

        self.send_broadcast(&id).await?;
        tracing::info!(broadcast_id = %id, "Broadcast sent");
        Ok(id)
    }
}

/// Turns a non-2xx response into [`DeliveryError::Api`], keeping the provider's message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ProviderError>(&text)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or(text);

    Err(DeliveryError::Api {
        status: status.as_u16(),
        message,
    })
}
