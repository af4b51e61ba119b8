use anyhow::{Context, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use base64::Engine;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::state::AppState;
use crate::config::RecognizerMode;
use crate::queue::{Job, JobWork};
use crate::recognizer::Utterance;
use crate::session::{SessionRegistry, TranscriptSegment};
use crate::stream::StreamChannel;
use crate::summarizer::SummarizerClient;

/// Messages a participant may send over its connection. Registration must
/// come first; audio chunks any time after.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "register", rename_all = "camelCase")]
    Register {
        meeting_id: String,
        participant_id: String,
    },
    #[serde(rename = "audioChunk", rename_all = "camelCase")]
    AudioChunk { base64_audio: String },
}

/// GET /ws — upgrade one participant connection
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_participant(socket, state))
}

struct Participant {
    meeting_id: String,
    participant_id: String,
    /// Present in streaming mode only
    stream: Option<StreamChannel>,
}

async fn handle_participant(socket: WebSocket, state: AppState) {
    let (mut sink, mut source) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // outbound writer: drains the registry-facing sender into the socket
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sink.send(Message::Text(payload)).await.is_err() {
                // connection is gone; the read side unregisters
                break;
            }
        }
    });

    let mut participant: Option<Participant> = None;

    while let Some(message) = source.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                debug!("participant socket error: {}", e);
                break;
            }
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let parsed: ClientMessage = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("ignoring malformed client message: {:#}", e);
                continue;
            }
        };

        match parsed {
            ClientMessage::Register {
                meeting_id,
                participant_id,
            } => {
                if participant.is_some() {
                    warn!("duplicate register on one connection, ignoring");
                    continue;
                }

                info!(
                    "new participant {} registered for meeting {}",
                    participant_id, meeting_id
                );

                state
                    .registry
                    .register(&meeting_id, &participant_id, tx.clone())
                    .await;
                state.summarizer.start_session(&meeting_id).await;

                let stream = match state.mode {
                    RecognizerMode::Streaming => {
                        open_participant_stream(&state, &meeting_id, &participant_id)
                    }
                    RecognizerMode::Batch => None,
                };

                participant = Some(Participant {
                    meeting_id,
                    participant_id,
                    stream,
                });
            }

            ClientMessage::AudioChunk { base64_audio } => {
                let Some(active) = participant.as_ref() else {
                    warn!("audio chunk before register, ignoring");
                    continue;
                };

                let audio = match decode_audio(&base64_audio) {
                    Ok(audio) => audio,
                    Err(e) => {
                        warn!(
                            "undecodable audio chunk from {}: {:#}",
                            active.participant_id, e
                        );
                        continue;
                    }
                };

                debug!(
                    "received audio chunk for meeting {} from {}",
                    active.meeting_id, active.participant_id
                );

                match &active.stream {
                    Some(stream) => stream.send(audio),
                    None => submit_recognition_job(&state, active, audio),
                }
            }
        }
    }

    if let Some(active) = participant {
        if let Some(stream) = &active.stream {
            stream.close();
        }
        state
            .registry
            .unregister(&active.meeting_id, &active.participant_id)
            .await;
    }
    writer.abort();
}

/// Chunks may arrive as bare base64 or as a browser data URL; the prefix is
/// stripped if present.
fn decode_audio(content: &str) -> Result<Vec<u8>> {
    let encoded = content.rsplit(',').next().unwrap_or(content);
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("invalid base64 audio")
}

/// Batch mode: wrap the recognition pipeline for one chunk into a queue job
fn submit_recognition_job(state: &AppState, active: &Participant, audio: Vec<u8>) {
    let recognizer = Arc::clone(&state.recognizer);
    let registry = Arc::clone(&state.registry);
    let summarizer = state.summarizer.clone();
    let meeting_id = active.meeting_id.clone();
    let participant_id = active.participant_id.clone();

    let work: JobWork = Box::new(move |payload: Vec<u8>| {
        Box::pin(async move {
            let utterances = recognizer
                .recognize(payload)
                .await
                .context("recognition failed")?;

            for utterance in utterances {
                deliver_segment(&registry, &summarizer, &meeting_id, &participant_id, utterance)
                    .await;
            }
            Ok(())
        })
    });

    state.queue.submit(Job::new(audio, work));
}

/// Streaming mode: open the participant's reconnecting stream and spawn the
/// task that delivers everything recognized on it.
fn open_participant_stream(
    state: &AppState,
    meeting_id: &str,
    participant_id: &str,
) -> Option<StreamChannel> {
    let (segment_tx, mut segment_rx) = mpsc::unbounded_channel();

    let Some(transport) = state
        .recognizer
        .open_stream(meeting_id, participant_id, segment_tx)
    else {
        warn!("backend has no streaming support, falling back to batch recognition");
        return None;
    };

    let channel = StreamChannel::spawn(transport, state.stream_retry_delay);

    let registry = Arc::clone(&state.registry);
    let summarizer = state.summarizer.clone();
    let meeting_id = meeting_id.to_string();
    let participant_id = participant_id.to_string();
    tokio::spawn(async move {
        while let Some(utterance) = segment_rx.recv().await {
            deliver_segment(&registry, &summarizer, &meeting_id, &participant_id, utterance)
                .await;
        }
    });

    Some(channel)
}

/// The delivery pipeline shared by both modes: stamp the utterance, persist
/// it, fan it out to the meeting, feed the summarizer. Segmenting engines
/// supply clip-relative offsets; otherwise the segment is stamped with its
/// receipt time.
async fn deliver_segment(
    registry: &SessionRegistry,
    summarizer: &SummarizerClient,
    meeting_id: &str,
    participant_id: &str,
    utterance: Utterance,
) {
    let now = chrono::Utc::now().timestamp_millis();
    let (from, until) = match (utterance.from_ms, utterance.until_ms) {
        (Some(from), Some(until)) => (from, until),
        _ => (now, now + 1),
    };

    let segment = TranscriptSegment::new(from, until, participant_id, utterance.text);

    registry.append_transcript(meeting_id, segment.clone()).await;

    match serde_json::to_string(&segment) {
        Ok(json) => registry.broadcast(meeting_id, &json).await,
        Err(e) => error!("failed to serialize segment: {:#}", e),
    }

    summarizer
        .publish_segment(meeting_id, &segment.summary_line())
        .await;
}

#[cfg(test)]
mod tests {
    use super::decode_audio;

    #[test]
    fn decodes_bare_base64() {
        assert_eq!(decode_audio("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn strips_data_url_prefix() {
        assert_eq!(
            decode_audio("data:audio/wav;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_audio("not base64 at all!").is_err());
    }
}
