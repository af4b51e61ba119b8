use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::segment::TranscriptSegment;

/// Outbound handle for one connected participant. Payloads are delivered
/// verbatim; a closed receiver marks the connection as broken.
pub type ParticipantSender = mpsc::UnboundedSender<String>;

/// One active conversation: its connected participants, the transcript
/// accumulated so far, and the recurring recommendation task if one is
/// running.
pub(crate) struct Meeting {
    pub(crate) participants: HashMap<String, ParticipantSender>,
    pub(crate) transcript: Vec<TranscriptSegment>,
    pub(crate) scheduled: Option<JoinHandle<()>>,
}

impl Meeting {
    pub(crate) fn new() -> Self {
        Self {
            participants: HashMap::new(),
            transcript: Vec::new(),
            scheduled: None,
        }
    }

    /// Stop the recurring task, if one is running
    pub(crate) fn clear_scheduled(&mut self) {
        if let Some(task) = self.scheduled.take() {
            task.abort();
            debug!("scheduled task stopped");
        }
    }
}

impl Drop for Meeting {
    fn drop(&mut self) {
        self.clear_scheduled();
    }
}
