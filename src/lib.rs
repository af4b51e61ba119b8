pub mod config;
pub mod http;
pub mod nats;
pub mod queue;
pub mod recognizer;
pub mod session;
pub mod stream;
pub mod summarizer;

pub use config::Config;
pub use http::{create_router, AppState, ClientMessage};
pub use nats::{AudioFrameMessage, NatsClient, UtteranceMessage};
pub use queue::{Job, JobQueue};
pub use recognizer::{Recognizer, RecognizerFactory, Utterance};
pub use session::{ScheduledCallback, SessionRegistry, TranscriptSegment};
pub use stream::{StreamChannel, StreamLink, StreamTransport};
pub use summarizer::SummarizerClient;
