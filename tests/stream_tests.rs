use anyhow::Result;
use async_trait::async_trait;
use meeting_relay::stream::{StreamChannel, StreamLink, StreamTransport};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted transport: connection attempts succeed or fail on a switch,
/// delivered chunks are recorded, and the live link can be made to drop.
#[derive(Default)]
struct Script {
    connect_ok: AtomicBool,
    attempts: AtomicUsize,
    fail_sends: AtomicBool,
    sent: Mutex<Vec<Vec<u8>>>,
    sentinel_sent: AtomicBool,
}

struct ScriptedTransport {
    script: Arc<Script>,
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    async fn open(&self) -> Result<Box<dyn StreamLink>> {
        self.script.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.script.connect_ok.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        Ok(Box::new(ScriptedLink {
            script: self.script.clone(),
        }))
    }
}

struct ScriptedLink {
    script: Arc<Script>,
}

#[async_trait]
impl StreamLink for ScriptedLink {
    async fn send(&mut self, chunk: &[u8]) -> Result<()> {
        if self.script.fail_sends.load(Ordering::SeqCst) {
            anyhow::bail!("link dropped");
        }
        self.script.sent.lock().unwrap().push(chunk.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.script.sentinel_sent.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn channel_with(script: &Arc<Script>, retry: Duration) -> StreamChannel {
    StreamChannel::spawn(
        Arc::new(ScriptedTransport {
            script: script.clone(),
        }),
        retry,
    )
}

fn sent(script: &Script) -> Vec<Vec<u8>> {
    script.sent.lock().unwrap().clone()
}

#[tokio::test]
async fn chunks_buffered_while_down_flush_in_order_before_later_sends() {
    let script = Arc::new(Script::default());
    let channel = channel_with(&script, Duration::from_millis(10));

    channel.send(b"one".to_vec());
    channel.send(b"two".to_vec());
    channel.send(b"three".to_vec());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(sent(&script).is_empty());
    assert!(script.attempts.load(Ordering::SeqCst) >= 1);

    script.connect_ok.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    channel.send(b"four".to_vec());
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(
        sent(&script),
        vec![
            b"one".to_vec(),
            b"two".to_vec(),
            b"three".to_vec(),
            b"four".to_vec()
        ]
    );
}

#[tokio::test]
async fn failed_attempts_are_paced_by_the_retry_delay() {
    let script = Arc::new(Script::default());
    let _channel = channel_with(&script, Duration::from_millis(25));

    tokio::time::sleep(Duration::from_millis(105)).await;

    let attempts = script.attempts.load(Ordering::SeqCst);
    assert!(attempts >= 2, "expected repeated dials, got {}", attempts);
    assert!(attempts <= 8, "retry delay was not honored, got {}", attempts);
}

#[tokio::test]
async fn chunks_survive_a_mid_session_drop() {
    let script = Arc::new(Script::default());
    script.connect_ok.store(true, Ordering::SeqCst);
    let channel = channel_with(&script, Duration::from_millis(20));

    channel.send(b"before".to_vec());
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(sent(&script), vec![b"before".to_vec()]);

    script.fail_sends.store(true, Ordering::SeqCst);
    channel.send(b"after".to_vec());
    tokio::time::sleep(Duration::from_millis(60)).await;

    script.fail_sends.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(sent(&script), vec![b"before".to_vec(), b"after".to_vec()]);
}

#[tokio::test]
async fn close_sends_the_sentinel_and_stops_reconnecting() {
    let script = Arc::new(Script::default());
    script.connect_ok.store(true, Ordering::SeqCst);
    let channel = channel_with(&script, Duration::from_millis(10));

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(script.attempts.load(Ordering::SeqCst), 1);

    channel.close();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(script.sentinel_sent.load(Ordering::SeqCst));

    // sends after the terminal close are dropped, no redial happens
    channel.send(b"too late".to_vec());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(script.attempts.load(Ordering::SeqCst), 1);
    assert!(sent(&script).is_empty());
}

#[tokio::test]
async fn close_while_disconnected_terminates_without_a_sentinel() {
    let script = Arc::new(Script::default());
    let channel = channel_with(&script, Duration::from_millis(10));

    channel.send(b"never delivered".to_vec());
    tokio::time::sleep(Duration::from_millis(30)).await;
    channel.close();
    tokio::time::sleep(Duration::from_millis(30)).await;

    // a late recovery must not resurrect the stream
    script.connect_ok.store(true, Ordering::SeqCst);
    let attempts = script.attempts.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!script.sentinel_sent.load(Ordering::SeqCst));
    assert_eq!(script.attempts.load(Ordering::SeqCst), attempts);
    assert!(sent(&script).is_empty());
}
