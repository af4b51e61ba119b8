use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use super::channel::{StreamLink, StreamTransport};
use crate::nats::{AudioFrameMessage, NatsClient, UtteranceMessage};
use crate::recognizer::Utterance;

/// NATS transport for one participant's recognizer stream: audio frames go
/// out on `stt.audio.<meeting>.<participant>`, recognized utterances come
/// back on `stt.text.<meeting>.<participant>`. Each successful `open`
/// installs a fresh subscription, so nothing recognized is lost across
/// reconnects.
pub struct NatsStreamTransport {
    nats: NatsClient,
    meeting_id: String,
    participant_id: String,
    segments: mpsc::UnboundedSender<Utterance>,
}

impl NatsStreamTransport {
    pub fn new(
        nats: NatsClient,
        meeting_id: String,
        participant_id: String,
        segments: mpsc::UnboundedSender<Utterance>,
    ) -> Self {
        Self {
            nats,
            meeting_id,
            participant_id,
            segments,
        }
    }

    fn audio_subject(&self) -> String {
        format!("stt.audio.{}.{}", self.meeting_id, self.participant_id)
    }

    fn text_subject(&self) -> String {
        format!("stt.text.{}.{}", self.meeting_id, self.participant_id)
    }
}

#[async_trait]
impl StreamTransport for NatsStreamTransport {
    async fn open(&self) -> Result<Box<dyn StreamLink>> {
        let mut subscriber = self
            .nats
            .inner()
            .subscribe(self.text_subject())
            .await
            .context("Failed to subscribe to recognizer output")?;

        let segments = self.segments.clone();
        let reader: JoinHandle<()> = tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                match serde_json::from_slice::<UtteranceMessage>(&message.payload) {
                    Ok(utterance) => {
                        if segments.send(Utterance::from(utterance)).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("unparseable transcript message: {:#}", e),
                }
            }
        });

        Ok(Box::new(NatsStreamLink {
            nats: self.nats.clone(),
            subject: self.audio_subject(),
            meeting_id: self.meeting_id.clone(),
            participant_id: self.participant_id.clone(),
            sequence: 0,
            reader,
        }))
    }
}

struct NatsStreamLink {
    nats: NatsClient,
    subject: String,
    meeting_id: String,
    participant_id: String,
    sequence: u32,
    reader: JoinHandle<()>,
}

impl NatsStreamLink {
    fn frame(&mut self, pcm: &[u8], final_frame: bool) -> AudioFrameMessage {
        let sequence = self.sequence;
        self.sequence += 1;

        AudioFrameMessage {
            meeting_id: self.meeting_id.clone(),
            participant_id: self.participant_id.clone(),
            sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(pcm),
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame,
        }
    }
}

#[async_trait]
impl StreamLink for NatsStreamLink {
    async fn send(&mut self, chunk: &[u8]) -> Result<()> {
        let message = self.frame(chunk, false);
        self.nats.publish_json(self.subject.clone(), &message).await
    }

    async fn close(&mut self) -> Result<()> {
        // an empty frame with the final flag set is the end-of-stream sentinel
        let message = self.frame(&[], true);
        let result = self.nats.publish_json(self.subject.clone(), &message).await;
        self.reader.abort();
        result
    }
}

impl Drop for NatsStreamLink {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
