use serde::{Deserialize, Serialize};

/// Audio frame published to the streaming recognizer
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub meeting_id: String,
    pub participant_id: String,
    /// Per-stream sequence number, preserved across reconnects
    pub sequence: u32,
    pub pcm: String, // Base64-encoded audio bytes
    pub timestamp: String, // RFC3339 timestamp
    /// End-of-stream sentinel: an empty frame with this flag set
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// One recognized utterance, received from the recognizer (streaming push
/// or batch reply). Offsets are seconds within the submitted audio; engines
/// that do not segment leave them unset.
#[derive(Debug, Serialize, Deserialize)]
pub struct UtteranceMessage {
    pub from: Option<f64>,
    pub until: Option<f64>,
    pub text: String,
}

/// Batch recognition request sent over request/reply
#[derive(Debug, Serialize, Deserialize)]
pub struct RecognizeRequest {
    pub pcm: String, // Base64-encoded audio bytes
}

/// Meeting lifecycle notification for the summarizer
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionControlMessage {
    pub meeting_id: String,
    pub action: SessionAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionAction {
    Start,
    Stop,
}
