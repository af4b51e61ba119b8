//! Speech-recognition backend boundary
//!
//! The engine itself is an external collaborator; this module only defines
//! the capability interface the relay talks to and the NATS-backed
//! implementation. The backend is selected once at startup and held as a
//! single trait object.

mod nats;

pub use nats::NatsRecognizer;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::RecognizerConfig;
use crate::nats::{NatsClient, UtteranceMessage};
use crate::stream::StreamTransport;

/// One recognized utterance. Offsets are milliseconds within the submitted
/// audio when the engine segments; engines that return plain text leave
/// them unset and the gateway stamps receipt time instead.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub from_ms: Option<i64>,
    pub until_ms: Option<i64>,
    pub text: String,
}

impl From<UtteranceMessage> for Utterance {
    fn from(message: UtteranceMessage) -> Self {
        Self {
            from_ms: message.from.map(|seconds| (seconds * 1000.0) as i64),
            until_ms: message.until.map(|seconds| (seconds * 1000.0) as i64),
            text: message.text,
        }
    }
}

/// Capability interface over the configured recognition backend
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Request/response recognition of one audio clip
    async fn recognize(&self, audio: Vec<u8>) -> Result<Vec<Utterance>>;

    /// Streaming seam, for backends that support a long-lived stream.
    /// Utterances recognized on the stream arrive on `segments`.
    fn open_stream(
        &self,
        meeting_id: &str,
        participant_id: &str,
        segments: mpsc::UnboundedSender<Utterance>,
    ) -> Option<Arc<dyn StreamTransport>>;
}

/// Builds the backend selected by configuration; called once at startup
pub struct RecognizerFactory;

impl RecognizerFactory {
    pub fn create(nats: NatsClient, config: &RecognizerConfig) -> Arc<dyn Recognizer> {
        Arc::new(NatsRecognizer::new(nats, config.clone()))
    }
}
