use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{Recognizer, Utterance};
use crate::config::RecognizerConfig;
use crate::nats::{NatsClient, RecognizeRequest, UtteranceMessage};
use crate::stream::{NatsStreamTransport, StreamTransport};

/// NATS-backed recognizer: batch recognition as a request/reply round trip,
/// streaming recognition over the per-participant stream transport.
pub struct NatsRecognizer {
    nats: NatsClient,
    config: RecognizerConfig,
}

impl NatsRecognizer {
    pub fn new(nats: NatsClient, config: RecognizerConfig) -> Self {
        Self { nats, config }
    }
}

#[async_trait]
impl Recognizer for NatsRecognizer {
    async fn recognize(&self, audio: Vec<u8>) -> Result<Vec<Utterance>> {
        let request = RecognizeRequest {
            pcm: base64::engine::general_purpose::STANDARD.encode(&audio),
        };
        let payload = serde_json::to_vec(&request)?;

        let reply = self
            .nats
            .request(self.config.request_subject.clone(), payload)
            .await
            .context("recognition request failed")?;

        let utterances: Vec<UtteranceMessage> =
            serde_json::from_slice(&reply).context("unparseable recognizer reply")?;

        Ok(utterances.into_iter().map(Utterance::from).collect())
    }

    fn open_stream(
        &self,
        meeting_id: &str,
        participant_id: &str,
        segments: mpsc::UnboundedSender<Utterance>,
    ) -> Option<Arc<dyn StreamTransport>> {
        Some(Arc::new(NatsStreamTransport::new(
            self.nats.clone(),
            meeting_id.to_string(),
            participant_id.to_string(),
            segments,
        )))
    }
}
