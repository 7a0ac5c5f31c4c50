//! VASTE - Resilient response-time telemetry for multi-channel chatbots
//!
//! Records a handful of sample measurements and forwards them through the
//! resilient delivery path, then prints the per-channel aggregate.
//!
//! ## Usage
//!
//! ```bash
//! # Echo records to stdout (no credentials needed)
//! cargo run
//!
//! # Deliver to Axiom
//! AXIOM_TOKEN=xaat-... AXIOM_ORG_ID=my-org cargo run
//! ```
//!
//! ## Environment Variables
//!
//! - `AXIOM_TOKEN`: backend API token (stdout echo when unset)
//! - `AXIOM_ORG_ID`: backend organization id
//! - `AXIOM_DATASET`: dataset name (default: "chatbot-monitoring")
//! - `VASTE_FAILURE_THRESHOLD`: failures before the circuit opens (default: 5)
//! - `VASTE_COOLDOWN_SECS`: open-circuit cooldown (default: 60)
//! - `VASTE_MAX_ATTEMPTS`: delivery attempts per record (default: 3)
//! - `VASTE_RETENTION_DAYS`: fallback file retention (default: 7)
//! - `VASTE_LOG_LEVEL`: log level (default: "info")

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vaste::{
    AxiomIngestor, DeliveryClient, Ingestor, MonitorConfig, ResponseTimeRecorder, StdoutIngestor,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = MonitorConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ingestor: Arc<dyn Ingestor> = if config.token.is_some() {
        Arc::new(AxiomIngestor::from_config(&config)?)
    } else {
        info!("AXIOM_TOKEN not set, echoing records to stdout");
        Arc::new(StdoutIngestor::pretty())
    };

    info!(
        ingestor = ingestor.name(),
        dataset = %config.dataset,
        failure_threshold = config.failure_threshold,
        max_attempts = config.max_attempts,
        "Starting VASTE monitor"
    );

    let client = DeliveryClient::new(ingestor, &config);
    let recorder = ResponseTimeRecorder::new(client, &config).await;

    // Sample measurements across the tracked channels; the 6.1s email
    // response trips the SLA alert, and the unrecognized "sms" channel
    // lands in the catch-all bucket.
    recorder.record("chat", 3.2).await;
    recorder.record("voz", 4.7).await;
    recorder.record("email", 6.1).await;
    recorder.record("chat", 2.8).await;
    recorder.record("sms", 1.9).await;

    let mut report: Vec<_> = recorder.aggregate().into_iter().collect();
    report.sort_by(|a, b| a.0.cmp(&b.0));
    for (channel, mean) in report {
        info!(channel = %channel, mean_s = mean, "aggregate response time");
    }

    info!("VASTE monitor run complete");
    Ok(())
}
