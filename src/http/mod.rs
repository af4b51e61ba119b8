//! Relay gateway
//!
//! Terminates participant WebSocket connections and the REST control
//! surface:
//! - GET /ws - participant connection (register, then audio chunks)
//! - GET /transcripts/:id - full transcript of a meeting
//! - DELETE /transcripts/:id - explicit meeting deletion
//! - POST /summaries/:id - relay a summary callback to participants
//! - GET /health - health check

mod handlers;
mod routes;
mod state;
mod ws;

pub use routes::create_router;
pub use state::AppState;
pub use ws::ClientMessage;
