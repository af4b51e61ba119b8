use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Transport seam for the reconnecting channel: one call to `open` performs
/// one connection attempt and yields a live link on success.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(&self) -> Result<Box<dyn StreamLink>>;
}

/// One established link to the streaming recognizer
#[async_trait]
pub trait StreamLink: Send {
    /// Ship one audio payload. An error means the link is dead.
    async fn send(&mut self, chunk: &[u8]) -> Result<()>;

    /// Send the end-of-stream sentinel, then tear the link down
    async fn close(&mut self) -> Result<()>;
}

enum Command {
    Send(Vec<u8>),
    Close,
}

/// Reconnect-aware outbound stream for one participant's audio.
///
/// Chunks sent while the link is down are buffered and flushed in arrival
/// order after the next successful connection; nothing is dropped while the
/// channel is alive, at the cost of an unbounded buffer during an outage.
/// `close` is terminal: the end-of-stream marker goes out if the link is up
/// and no further reconnects are attempted.
#[derive(Clone)]
pub struct StreamChannel {
    tx: mpsc::UnboundedSender<Command>,
}

impl StreamChannel {
    /// Spawn the channel actor; the first connection attempt starts
    /// immediately.
    pub fn spawn(transport: Arc<dyn StreamTransport>, retry_delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(transport, retry_delay, rx));
        Self { tx }
    }

    /// Queue one chunk for delivery, preserving submission order across
    /// reconnects. Never blocks.
    pub fn send(&self, chunk: Vec<u8>) {
        if self.tx.send(Command::Send(chunk)).is_err() {
            warn!("stream channel already closed, dropping audio chunk");
        }
    }

    /// Terminal close; safe to call regardless of connection state
    pub fn close(&self) {
        let _ = self.tx.send(Command::Close);
    }
}

enum Attempt {
    Link(Result<Box<dyn StreamLink>>),
    Closed,
}

async fn run(
    transport: Arc<dyn StreamTransport>,
    retry_delay: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut link: Option<Box<dyn StreamLink>> = None;
    let mut buffer: VecDeque<Vec<u8>> = VecDeque::new();
    // the first attempt happens right away; after that, a dead link is only
    // redialed once there is traffic to deliver
    let mut dial = true;

    'outer: loop {
        if link.is_none() && (dial || !buffer.is_empty()) {
            match open_watching_commands(transport.as_ref(), &mut rx, &mut buffer).await {
                Attempt::Closed => break 'outer,
                Attempt::Link(Ok(mut new_link)) => {
                    if buffer.is_empty() || flush(&mut new_link, &mut buffer).await {
                        debug!("stream link established");
                        link = Some(new_link);
                        dial = false;
                    } else if !back_off(retry_delay, &mut rx, &mut buffer).await {
                        break 'outer;
                    }
                }
                Attempt::Link(Err(e)) => {
                    warn!(
                        "stream connection failed, retrying in {:?}: {:#}",
                        retry_delay, e
                    );
                    if !back_off(retry_delay, &mut rx, &mut buffer).await {
                        break 'outer;
                    }
                }
            }
            continue;
        }

        match rx.recv().await {
            Some(Command::Send(chunk)) => {
                buffer.push_back(chunk);
                if let Some(mut live) = link.take() {
                    if flush(&mut live, &mut buffer).await {
                        link = Some(live);
                    }
                    // a failed flush keeps the unsent chunks queued; the
                    // next loop turn redials
                }
            }
            Some(Command::Close) | None => break 'outer,
        }
    }

    if let Some(mut live) = link {
        if let Err(e) = live.close().await {
            warn!("end-of-stream marker could not be sent: {:#}", e);
        }
    }
    if !buffer.is_empty() {
        warn!(
            "stream channel closed with {} undelivered chunks",
            buffer.len()
        );
    }
    debug!("stream channel terminated");
}

/// Run one connection attempt while staying responsive to commands, so a
/// close can interrupt a hung dial and sends keep queueing in order.
async fn open_watching_commands(
    transport: &dyn StreamTransport,
    rx: &mut mpsc::UnboundedReceiver<Command>,
    buffer: &mut VecDeque<Vec<u8>>,
) -> Attempt {
    let mut open_fut = transport.open();
    loop {
        tokio::select! {
            attempt = &mut open_fut => return Attempt::Link(attempt),
            cmd = rx.recv() => match cmd {
                Some(Command::Send(chunk)) => buffer.push_back(chunk),
                Some(Command::Close) | None => return Attempt::Closed,
            }
        }
    }
}

/// Sleep out the retry delay while still accepting commands. Returns false
/// when a close arrived and the actor should exit.
async fn back_off(
    retry_delay: Duration,
    rx: &mut mpsc::UnboundedReceiver<Command>,
    buffer: &mut VecDeque<Vec<u8>>,
) -> bool {
    let deadline = tokio::time::Instant::now() + retry_delay;
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return true,
            cmd = rx.recv() => match cmd {
                Some(Command::Send(chunk)) => buffer.push_back(chunk),
                Some(Command::Close) | None => return false,
            }
        }
    }
}

/// Drain the buffer head-first over the link. Returns false when the link
/// died mid-flush; the failed chunk and everything behind it stay queued.
async fn flush(link: &mut Box<dyn StreamLink>, buffer: &mut VecDeque<Vec<u8>>) -> bool {
    while let Some(chunk) = buffer.front() {
        if let Err(e) = link.send(chunk).await {
            warn!(
                "stream send failed, keeping {} chunks for retry: {:#}",
                buffer.len(),
                e
            );
            return false;
        }
        buffer.pop_front();
    }
    true
}
