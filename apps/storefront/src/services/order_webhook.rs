// storefront/src/services/order_webhook.rs

//! Outbound "order placed" webhook. A single attempt per call; retries are
//! the outbox's job.

use async_trait::async_trait;
use bagworks::OrderWebhook;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
  /// Network, DNS or timeout failure.
  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Webhook returned HTTP {0}")]
  HttpStatus(u16),
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacedPayload {
  pub order_id: Uuid,
}

pub struct HttpOrderWebhook {
  client: reqwest::Client,
  url: String,
  bearer_token: Option<String>,
}

impl HttpOrderWebhook {
  pub fn new(url: impl Into<String>, bearer_token: Option<String>) -> Result<Self, WebhookError> {
    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(Self {
      client,
      url: url.into(),
      bearer_token,
    })
  }

  pub async fn send(&self, order_id: Uuid) -> Result<(), WebhookError> {
    let mut request = self.client.post(&self.url).json(&OrderPlacedPayload { order_id });
    if let Some(token) = &self.bearer_token {
      request = request.bearer_auth(token);
    }
    let response = request.send().await?;
    if !response.status().is_success() {
      return Err(WebhookError::HttpStatus(response.status().as_u16()));
    }
    Ok(())
  }
}

#[async_trait]
impl OrderWebhook for HttpOrderWebhook {
  #[instrument(name = "HttpOrderWebhook::order_placed", skip(self), fields(url = %self.url))]
  async fn order_placed(&self, order_id: Uuid) -> anyhow::Result<()> {
    self.send(order_id).await?;
    info!(%order_id, "Order webhook delivered.");
    Ok(())
  }
}
