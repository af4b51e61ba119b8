use super::handlers;
use super::state::AppState;
use super::ws;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Participant connections
        .route("/ws", get(ws::ws_handler))
        // Transcript queries and explicit meeting deletion
        .route(
            "/transcripts/:meeting_id",
            get(handlers::get_transcript).delete(handlers::delete_meeting),
        )
        // Summary callbacks relayed to participants
        .route("/summaries/:meeting_id", post(handlers::relay_summary))
        // Browser clients connect from arbitrary origins
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
