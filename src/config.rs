use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub nats: NatsConfig,
    pub recognizer: RecognizerConfig,
    pub stream: StreamConfig,
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    pub url: String,
}

/// How audio is handed to the speech-recognition backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerMode {
    /// One request/response recognition call per audio chunk, serialized
    /// through the job queue
    Batch,
    /// Long-lived per-participant stream to the recognizer
    Streaming,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerConfig {
    pub mode: RecognizerMode,
    /// Subject the batch recognizer answers request/reply on
    pub request_subject: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Delay before retrying a failed stream connection, in milliseconds
    pub retry_delay_ms: u64,
}

impl StreamConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    /// How often each active meeting polls for a fresh recommendation
    pub reco_interval_ms: u64,
    /// Request/reply subject prefix for recommendation fetches
    pub reco_subject: String,
    /// Publish subject prefix for the transcript line feed
    pub ingest_subject: String,
    /// Subject for meeting start/stop lifecycle notifications
    pub session_subject: String,
}

impl SummarizerConfig {
    pub fn reco_interval(&self) -> Duration {
        Duration::from_millis(self.reco_interval_ms)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
