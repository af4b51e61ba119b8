use super::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /transcripts/:meeting_id
/// Full transcript of a meeting as JSON; 404 when the meeting is unknown
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> impl IntoResponse {
    info!("received request for transcript of meeting {}", meeting_id);

    if !state.registry.meeting_exists(&meeting_id).await {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Meeting {} not found", meeting_id),
            }),
        )
            .into_response();
    }

    let transcript = state.registry.get_transcript(&meeting_id).await;
    (StatusCode::OK, Json(transcript)).into_response()
}

/// POST /summaries/:meeting_id
/// Relay an externally computed summary verbatim to every participant
pub async fn relay_summary(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    info!("received summary for meeting {}", meeting_id);

    state.registry.broadcast(&meeting_id, &body.to_string()).await;
    (StatusCode::OK, "OK")
}

/// DELETE /transcripts/:meeting_id
/// Explicitly delete a meeting and its retained transcript
pub async fn delete_meeting(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> impl IntoResponse {
    if state.registry.remove_meeting(&meeting_id).await {
        state.summarizer.stop_session(&meeting_id).await;
        (StatusCode::OK, "OK").into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Meeting {} not found", meeting_id),
            }),
        )
            .into_response()
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
