//! Reconnecting transcript stream
//!
//! Long-lived outbound link to a streaming recognizer for one participant's
//! audio, tolerant of the link dropping mid-session. The state machine in
//! `channel` is transport-agnostic; `nats` provides the production
//! transport.

mod channel;
mod nats;

pub use channel::{StreamChannel, StreamLink, StreamTransport};
pub use nats::NatsStreamTransport;
