use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use meeting_relay::config::Config;
use meeting_relay::http::{create_router, AppState};
use meeting_relay::nats::NatsClient;
use meeting_relay::queue::JobQueue;
use meeting_relay::recognizer::RecognizerFactory;
use meeting_relay::session::SessionRegistry;
use meeting_relay::summarizer::{self, SummarizerClient};

#[derive(Parser)]
#[command(name = "meeting-relay", about = "Real-time meeting transcription relay")]
struct Args {
    /// Path to the configuration file, without extension
    #[arg(long, default_value = "config/meeting-relay")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} starting", cfg.service.name);

    let nats = NatsClient::connect(&cfg.nats.url)
        .await
        .context("recognizer/summarizer backbone is unreachable")?;

    let registry = Arc::new(SessionRegistry::new());
    let recognizer = RecognizerFactory::create(nats.clone(), &cfg.recognizer);
    let summarizer = SummarizerClient::new(nats, cfg.summarizer.clone());
    let queue = JobQueue::new();

    // schedule recommendation polling for every active meeting
    summarizer::install_scheduler(&registry, summarizer.clone(), cfg.summarizer.reco_interval())
        .await;

    let state = AppState {
        registry,
        queue,
        recognizer,
        summarizer,
        mode: cfg.recognizer.mode,
        stream_retry_delay: cfg.stream.retry_delay(),
    };

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("listening on {}", addr);

    axum::serve(listener, create_router(state))
        .await
        .context("server error")?;

    Ok(())
}
