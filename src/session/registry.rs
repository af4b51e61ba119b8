use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::meeting::{Meeting, ParticipantSender};
use super::segment::TranscriptSegment;

/// Recurring per-meeting callback installed via
/// [`SessionRegistry::set_scheduled_work`], invoked with the meeting id.
pub type ScheduledCallback = Arc<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Clone)]
struct ScheduledWork {
    callback: ScheduledCallback,
    interval: Duration,
}

/// Single source of truth for which meetings exist, who is connected to
/// each, and the accumulated transcripts.
///
/// All state lives behind one async mutex, so membership changes and
/// scheduled-task start/stop for a meeting happen in the same critical
/// section: a leave racing a join can never strand a running task on an
/// empty meeting, or leave a populated meeting without one. The lock is
/// never held across I/O.
///
/// Teardown policy: scheduling stops the moment a meeting empties, but the
/// meeting and its transcript are retained until explicitly removed.
pub struct SessionRegistry {
    inner: Mutex<Inner>,
}

struct Inner {
    meetings: HashMap<String, Meeting>,
    work: Option<ScheduledWork>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                meetings: HashMap::new(),
                work: None,
            }),
        }
    }

    /// Add a participant to a meeting, creating the meeting if absent. The
    /// meeting's recurring task starts when the participant set becomes
    /// non-empty and recurring work is configured.
    pub async fn register(&self, meeting_id: &str, participant_id: &str, sender: ParticipantSender) {
        let mut inner = self.inner.lock().await;
        let work = inner.work.clone();

        let meeting = inner
            .meetings
            .entry(meeting_id.to_string())
            .or_insert_with(|| {
                info!("creating meeting {}", meeting_id);
                Meeting::new()
            });

        meeting.participants.insert(participant_id.to_string(), sender);

        if meeting.scheduled.is_none() {
            if let Some(work) = work {
                meeting.scheduled = Some(spawn_scheduled(meeting_id.to_string(), work));
            }
        }

        info!(
            "participant {} registered to meeting {} ({} connected)",
            participant_id,
            meeting_id,
            meeting.participants.len()
        );
    }

    /// Remove a participant; the recurring task stops once nobody is left.
    /// Unregistering from an unknown meeting is a warning, not an error.
    pub async fn unregister(&self, meeting_id: &str, participant_id: &str) {
        let mut inner = self.inner.lock().await;

        let Some(meeting) = inner.meetings.get_mut(meeting_id) else {
            warn!("trying to unregister from non-existing meeting {}", meeting_id);
            return;
        };

        meeting.participants.remove(participant_id);
        info!(
            "participant {} left meeting {} ({} connected)",
            participant_id,
            meeting_id,
            meeting.participants.len()
        );

        if meeting.participants.is_empty() {
            meeting.clear_scheduled();
            info!("meeting {} is empty, recommendation polling stopped", meeting_id);
        }
    }

    /// Append one recognized segment to the meeting's transcript
    pub async fn append_transcript(&self, meeting_id: &str, segment: TranscriptSegment) {
        let mut inner = self.inner.lock().await;

        match inner.meetings.get_mut(meeting_id) {
            Some(meeting) => meeting.transcript.push(segment),
            None => warn!(
                "trying to append transcript to non-existing meeting {}",
                meeting_id
            ),
        }
    }

    /// Send a payload verbatim to every participant of the meeting. A send
    /// that fails marks a broken connection; its own close handler will
    /// unregister it, so there is no retry here.
    pub async fn broadcast(&self, meeting_id: &str, payload: &str) {
        let inner = self.inner.lock().await;

        let Some(meeting) = inner.meetings.get(meeting_id) else {
            warn!("trying to broadcast to non-existing meeting {}", meeting_id);
            return;
        };

        for (participant_id, sender) in &meeting.participants {
            if sender.send(payload.to_string()).is_err() {
                warn!(
                    "dropping broadcast to {}: connection is gone",
                    participant_id
                );
            }
        }
    }

    /// Full transcript so far; empty when the meeting is unknown
    pub async fn get_transcript(&self, meeting_id: &str) -> Vec<TranscriptSegment> {
        let inner = self.inner.lock().await;
        inner
            .meetings
            .get(meeting_id)
            .map(|meeting| meeting.transcript.clone())
            .unwrap_or_default()
    }

    pub async fn meeting_exists(&self, meeting_id: &str) -> bool {
        self.inner.lock().await.meetings.contains_key(meeting_id)
    }

    /// Number of currently connected participants; zero when unknown
    pub async fn participant_count(&self, meeting_id: &str) -> usize {
        let inner = self.inner.lock().await;
        inner
            .meetings
            .get(meeting_id)
            .map(|meeting| meeting.participants.len())
            .unwrap_or(0)
    }

    /// Whether the meeting currently has a running recurring task
    pub async fn has_scheduled_task(&self, meeting_id: &str) -> bool {
        let inner = self.inner.lock().await;
        inner
            .meetings
            .get(meeting_id)
            .map(|meeting| meeting.scheduled.is_some())
            .unwrap_or(false)
    }

    /// Drop the meeting and its transcript, stopping any recurring task.
    /// Returns whether the meeting existed.
    pub async fn remove_meeting(&self, meeting_id: &str) -> bool {
        let mut inner = self.inner.lock().await;

        match inner.meetings.remove(meeting_id) {
            Some(_) => {
                info!("meeting {} removed", meeting_id);
                true
            }
            None => {
                warn!("trying to remove non-existing meeting {}", meeting_id);
                false
            }
        }
    }

    /// Configure the process-wide recurring work and its cadence, replacing
    /// the running task of every meeting that currently has participants.
    pub async fn set_scheduled_work(&self, callback: ScheduledCallback, interval: Duration) {
        let mut inner = self.inner.lock().await;
        let work = ScheduledWork { callback, interval };
        inner.work = Some(work.clone());

        for (meeting_id, meeting) in inner.meetings.iter_mut() {
            meeting.clear_scheduled();
            if !meeting.participants.is_empty() {
                meeting.scheduled = Some(spawn_scheduled(meeting_id.clone(), work.clone()));
            }
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_scheduled(meeting_id: String, work: ScheduledWork) -> JoinHandle<()> {
    debug!("starting scheduled task for meeting {}", meeting_id);

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(work.interval).await;
            (work.callback)(meeting_id.clone()).await;
        }
    })
}
