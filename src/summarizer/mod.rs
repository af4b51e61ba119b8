//! Online recommendation client and scheduler
//!
//! Talks to the external summarizer: a best-effort publish feed of every
//! recognized transcript line, a request/reply recommendation fetch polled
//! per meeting on a fixed cadence, and start/stop session notifications.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SummarizerConfig;
use crate::nats::{NatsClient, SessionAction, SessionControlMessage};
use crate::session::{ScheduledCallback, SessionRegistry};

#[derive(Clone)]
pub struct SummarizerClient {
    nats: NatsClient,
    config: SummarizerConfig,
}

impl SummarizerClient {
    pub fn new(nats: NatsClient, config: SummarizerConfig) -> Self {
        Self { nats, config }
    }

    /// Tell the summarizer a meeting went live
    pub async fn start_session(&self, meeting_id: &str) {
        if let Err(e) = self.send_control(meeting_id, SessionAction::Start).await {
            warn!("summarizer start for meeting {} failed: {:#}", meeting_id, e);
        } else {
            info!("summarizer session started for meeting {}", meeting_id);
        }
    }

    /// Tell the summarizer a meeting is over
    pub async fn stop_session(&self, meeting_id: &str) {
        if let Err(e) = self.send_control(meeting_id, SessionAction::Stop).await {
            warn!("summarizer stop for meeting {} failed: {:#}", meeting_id, e);
        } else {
            info!("summarizer session stopped for meeting {}", meeting_id);
        }
    }

    async fn send_control(&self, meeting_id: &str, action: SessionAction) -> Result<()> {
        let message = SessionControlMessage {
            meeting_id: meeting_id.to_string(),
            action,
        };
        self.nats
            .publish_json(self.config.session_subject.clone(), &message)
            .await
    }

    /// Best-effort feed of one transcript line. A failed publish drops the
    /// line with a warning, never buffers: this path feeds an analytics
    /// sink, not the transcript of record.
    pub async fn publish_segment(&self, meeting_id: &str, line: &str) {
        let subject = format!("{}.{}", self.config.ingest_subject, meeting_id);

        if let Err(e) = self
            .nats
            .inner()
            .publish(subject, line.to_string().into_bytes().into())
            .await
        {
            warn!(
                "dropping transcript line for summarizer (meeting {}): {:#}",
                meeting_id, e
            );
        }
    }

    /// Ask for the current recommendation; `Ok(None)` means "no content yet"
    pub async fn fetch_recommendation(&self, meeting_id: &str) -> Result<Option<String>> {
        let subject = format!("{}.{}", self.config.reco_subject, meeting_id);

        let reply = self
            .nats
            .request(subject, Vec::new())
            .await
            .context("recommendation request failed")?;

        let body = String::from_utf8(reply).context("recommendation reply is not UTF-8")?;
        Ok(parse_recommendation(&body))
    }
}

/// An empty reply, an empty JSON object, or a body whose `keywords` list is
/// empty all mean "nothing to recommend yet" and must not reach
/// participants. Anything else is pushed verbatim.
pub fn parse_recommendation(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if value.as_object().map_or(false, |object| object.is_empty()) {
            return None;
        }
        if let Some(keywords) = value.get("keywords").and_then(|k| k.as_array()) {
            if keywords.is_empty() {
                return None;
            }
        }
    }

    Some(trimmed.to_string())
}

/// One polling cycle: fetch, discard empty results, broadcast the rest.
/// Failures log and skip the cycle; the recurring task never stops for
/// a single bad cycle.
pub async fn run_cycle(registry: &SessionRegistry, client: &SummarizerClient, meeting_id: &str) {
    match client.fetch_recommendation(meeting_id).await {
        Ok(Some(recommendation)) => {
            debug!("pushing recommendation to meeting {}", meeting_id);
            registry.broadcast(meeting_id, &recommendation).await;
        }
        Ok(None) => debug!("no recommendation yet for meeting {}", meeting_id),
        Err(e) => warn!(
            "recommendation cycle for meeting {} skipped: {:#}",
            meeting_id, e
        ),
    }
}

/// Install the per-meeting recommendation poll as the registry's recurring
/// work
pub async fn install_scheduler(
    registry: &Arc<SessionRegistry>,
    client: SummarizerClient,
    interval: Duration,
) {
    let callback_registry = Arc::clone(registry);
    let callback: ScheduledCallback = Arc::new(move |meeting_id: String| {
        let registry = Arc::clone(&callback_registry);
        let client = client.clone();
        Box::pin(async move {
            run_cycle(&registry, &client, &meeting_id).await;
        })
    });

    registry.set_scheduled_work(callback, interval).await;
}

#[cfg(test)]
mod tests {
    use super::parse_recommendation;

    #[test]
    fn empty_reply_is_no_content() {
        assert_eq!(parse_recommendation(""), None);
        assert_eq!(parse_recommendation("   "), None);
    }

    #[test]
    fn empty_object_is_no_content() {
        assert_eq!(parse_recommendation("{}"), None);
    }

    #[test]
    fn empty_keyword_list_is_no_content() {
        assert_eq!(parse_recommendation(r#"{"keywords": []}"#), None);
    }

    #[test]
    fn keywords_pass_through_verbatim() {
        let body = r#"{"keywords": ["roadmap", "budget"]}"#;
        assert_eq!(parse_recommendation(body), Some(body.to_string()));
    }

    #[test]
    fn non_json_content_passes_through() {
        assert_eq!(
            parse_recommendation("plain summary text"),
            Some("plain summary text".to_string())
        );
    }
}
