use std::sync::Arc;
use std::time::Duration;

use crate::config::RecognizerMode;
use crate::queue::JobQueue;
use crate::recognizer::Recognizer;
use crate::session::SessionRegistry;
use crate::summarizer::SummarizerClient;

/// Shared application state for HTTP and WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub queue: JobQueue,
    pub recognizer: Arc<dyn Recognizer>,
    pub summarizer: SummarizerClient,
    pub mode: RecognizerMode,
    pub stream_retry_delay: Duration,
}
