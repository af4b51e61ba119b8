//! Serialized job processing
//!
//! Recognition work runs against a shared external engine, so it must not be
//! parallelized per connection: the queue guarantees at most one job in
//! flight at a time, in strict submission order. A failing job is logged and
//! discarded; it never blocks the jobs behind it. The backlog is unbounded.

use anyhow::Result;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// The work a job performs, given exclusive ownership of its payload
pub type JobWork = Box<dyn FnOnce(Vec<u8>) -> BoxFuture<'static, Result<()>> + Send>;

/// One unit of recognition work. Owned by the queue from submission until
/// completion or failure.
pub struct Job {
    pub id: Uuid,
    payload: Vec<u8>,
    work: JobWork,
}

impl Job {
    pub fn new(payload: Vec<u8>, work: JobWork) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            work,
        }
    }
}

/// Handle to the single queue worker. Cheap to clone; all clones feed the
/// same FIFO.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(worker(rx));
        Self { tx }
    }

    /// Append a job to the pending sequence. Never blocks the caller; the
    /// worker picks it up as soon as everything submitted before it is done.
    pub fn submit(&self, job: Job) {
        if self.tx.send(job).is_err() {
            error!("job queue worker is gone, dropping job");
        }
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

async fn worker(mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = rx.recv().await {
        debug!("Queue: processing job {} ({} jobs left)", job.id, rx.len());

        match (job.work)(job.payload).await {
            Ok(()) => debug!("Queue: done processing job {}", job.id),
            Err(e) => error!("Queue: job {} failed: {:#}", job.id, e),
        }
    }

    info!("Queue: closed, no more jobs to process");
}
