use serde::{Deserialize, Serialize};

/// A timestamped, speaker-attributed chunk of recognized text.
///
/// Appended once by the recognition-result path and never mutated afterwards.
/// Transcript order is append order; segments from concurrent streams may
/// arrive out of strict time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Segment start, epoch milliseconds
    pub from: i64,
    /// Segment end, epoch milliseconds
    pub until: i64,
    /// Participant the text is attributed to
    pub speaker: String,
    pub text: String,
}

impl TranscriptSegment {
    /// `until` is clamped so a segment never ends before it starts.
    pub fn new(from: i64, until: i64, speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            from,
            until: until.max(from),
            speaker: speaker.into(),
            text: text.into(),
        }
    }

    /// Tab-separated line fed to the summarizer ingest stream
    pub fn summary_line(&self) -> String {
        format!("{}\t{}\t{}\t{}", self.from, self.until, self.speaker, self.text)
    }
}
