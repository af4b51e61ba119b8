use base64::Engine;
use meeting_relay::http::ClientMessage;
use meeting_relay::nats::messages::{
    AudioFrameMessage, SessionAction, SessionControlMessage, UtteranceMessage,
};
use meeting_relay::session::TranscriptSegment;

#[test]
fn test_audio_frame_serialization() {
    let msg = AudioFrameMessage {
        meeting_id: "m1".to_string(),
        participant_id: "alice".to_string(),
        sequence: 0,
        pcm: base64::engine::general_purpose::STANDARD.encode([0u8; 100]),
        timestamp: "2026-08-07T14:30:00Z".to_string(),
        final_frame: false,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"meeting_id\":\"m1\""));
    assert!(json.contains("\"final\":false"));
    assert!(json.contains("\"sequence\":0"));

    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.meeting_id, "m1");
    assert_eq!(deserialized.participant_id, "alice");
    assert_eq!(deserialized.sequence, 0);
    assert!(!deserialized.final_frame);
}

#[test]
fn test_audio_frame_final_marker() {
    let msg = AudioFrameMessage {
        meeting_id: "m1".to_string(),
        participant_id: "alice".to_string(),
        sequence: 10,
        pcm: String::new(), // Empty for the end-of-stream sentinel
        timestamp: "2026-08-07T14:30:00Z".to_string(),
        final_frame: true,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"final\":true"));

    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    assert!(deserialized.final_frame);
    assert!(deserialized.pcm.is_empty());
    assert_eq!(deserialized.sequence, 10);
}

#[test]
fn test_utterance_with_segmentation() {
    let json = r#"{
        "from": 1.5,
        "until": 3.25,
        "text": "hello world"
    }"#;

    let msg: UtteranceMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.from, Some(1.5));
    assert_eq!(msg.until, Some(3.25));
    assert_eq!(msg.text, "hello world");
}

#[test]
fn test_utterance_without_segmentation() {
    let json = r#"{"text": "hello world"}"#;

    let msg: UtteranceMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.from, None);
    assert_eq!(msg.until, None);
    assert_eq!(msg.text, "hello world");
}

#[test]
fn test_session_control_action_casing() {
    let msg = SessionControlMessage {
        meeting_id: "m1".to_string(),
        action: SessionAction::Start,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"action\":\"START\""));

    let stop: SessionControlMessage =
        serde_json::from_str(r#"{"meeting_id":"m1","action":"STOP"}"#).unwrap();
    assert_eq!(stop.action, SessionAction::Stop);
}

#[test]
fn test_register_message_parsing() {
    let json = r#"{"type":"register","meetingId":"m1","participantId":"alice"}"#;

    match serde_json::from_str::<ClientMessage>(json).unwrap() {
        ClientMessage::Register {
            meeting_id,
            participant_id,
        } => {
            assert_eq!(meeting_id, "m1");
            assert_eq!(participant_id, "alice");
        }
        other => panic!("unexpected message: {:?}", other),
    }
}

#[test]
fn test_audio_chunk_message_parsing() {
    let json = r#"{"type":"audioChunk","base64Audio":"aGVsbG8="}"#;

    match serde_json::from_str::<ClientMessage>(json).unwrap() {
        ClientMessage::AudioChunk { base64_audio } => {
            assert_eq!(base64_audio, "aGVsbG8=");
        }
        other => panic!("unexpected message: {:?}", other),
    }
}

#[test]
fn test_unknown_message_type_is_rejected() {
    let json = r#"{"type":"selfDestruct"}"#;
    assert!(serde_json::from_str::<ClientMessage>(json).is_err());
}

#[test]
fn test_segment_wire_shape() {
    let segment = TranscriptSegment::new(1000, 2000, "alice", "hello");

    let json = serde_json::to_string(&segment).unwrap();
    assert!(json.contains("\"from\":1000"));
    assert!(json.contains("\"until\":2000"));
    assert!(json.contains("\"speaker\":\"alice\""));
    assert!(json.contains("\"text\":\"hello\""));
}

#[test]
fn test_segment_end_never_precedes_start() {
    let segment = TranscriptSegment::new(2000, 1000, "alice", "hello");
    assert_eq!(segment.from, 2000);
    assert_eq!(segment.until, 2000);
}

#[test]
fn test_segment_summary_line() {
    let segment = TranscriptSegment::new(1000, 1001, "alice", "hello world");
    assert_eq!(segment.summary_line(), "1000\t1001\talice\thello world");
}
