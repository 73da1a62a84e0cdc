//! Webhook notification for saved addresses.
//!
//! Downstream consumers (e.g. the buyer profile service that tracks a
//! buyer's current address) subscribe by pointing a webhook at us; delivery
//! failures are logged and never propagate into the save path.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::Address;
use crate::normalize::SaveListener;

#[derive(Serialize, Debug)]
struct SavedPayload<'a> {
    id: Option<Uuid>,
    formatted: &'a str,
    latitude: Option<f64>,
    longitude: Option<f64>,
    saved_at: String,
}

pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }

    async fn post(&self, address: &Address) -> anyhow::Result<()> {
        let payload = SavedPayload {
            id: address.id,
            formatted: &address.formatted,
            latitude: address.latitude,
            longitude: address.longitude,
            saved_at: chrono::Utc::now().to_rfc3339(),
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("webhook responded with an error: {}", error_text);
        }
        Ok(())
    }
}

#[async_trait]
impl SaveListener for WebhookNotifier {
    async fn address_saved(&self, address: &Address) {
        match self.post(address).await {
            Ok(()) => info!("Sent save notification for address {:?}", address.id),
            Err(e) => error!("Failed to send save notification: {}", e),
        }
    }
}
