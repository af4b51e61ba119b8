use anyhow::{Context, Result};
use async_nats::Client;
use serde::Serialize;
use tracing::info;

/// Shared NATS connection used by every external collaborator link
/// (recognizer and summarizer). Cheap to clone.
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Publish a JSON-serialized message to a subject
    pub async fn publish_json<T: Serialize>(&self, subject: String, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject, payload.into())
            .await
            .context("Failed to publish message")?;

        Ok(())
    }

    /// Request/reply round trip; returns the raw reply payload
    pub async fn request(&self, subject: String, payload: Vec<u8>) -> Result<Vec<u8>> {
        let reply = self
            .client
            .request(subject, payload.into())
            .await
            .context("Request failed")?;

        Ok(reply.payload.to_vec())
    }
}
