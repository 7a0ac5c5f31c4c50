//! Axiom ingestor for VASTE
//!
//! POSTs records as a JSON array to the Axiom dataset ingest endpoint.
//!
//! # Example
//!
//! ```ignore
//! let ingestor = AxiomIngestor::new(
//!     "https://api.axiom.co",
//!     "chatbot-monitoring",
//!     "xaat-token",
//!     Some("my-org".into()),
//! )?;
//! let client = DeliveryClient::new(Arc::new(ingestor), &config);
//! ```

use crate::config::MonitorConfig;
use crate::error::IngestError;
use crate::ingest::Ingestor;
use crate::record::TelemetryRecord;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// Public Axiom API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.axiom.co";

/// Organization header expected by the API
const ORG_ID_HEADER: &str = "X-Axiom-Org-Id";

/// Axiom ingestor - POSTs records to a dataset ingest endpoint
pub struct AxiomIngestor {
    client: Client,
    url: String,
    token: String,
    org_id: Option<String>,
}

impl AxiomIngestor {
    /// Create a new AxiomIngestor for the given dataset
    ///
    /// The HTTP client enforces the request timeout both on connect and on
    /// the full request, so a hung backend surfaces as a retryable
    /// connection error instead of blocking the delivery loop.
    ///
    /// # Errors
    /// Returns `IngestError::Init` if the HTTP client cannot be created
    pub fn new(
        base_url: impl Into<String>,
        dataset: impl Into<String>,
        token: impl Into<String>,
        org_id: Option<String>,
    ) -> Result<Self, IngestError> {
        Self::with_timeout(base_url, dataset, token, org_id, Duration::from_secs(5))
    }

    /// Create an AxiomIngestor with an explicit network timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        dataset: impl Into<String>,
        token: impl Into<String>,
        org_id: Option<String>,
        timeout: Duration,
    ) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| IngestError::Init(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into();
        let url = format!(
            "{}/v1/datasets/{}/ingest",
            base_url.trim_end_matches('/'),
            dataset.into()
        );

        Ok(Self {
            client,
            url,
            token: token.into(),
            org_id,
        })
    }

    /// Create an AxiomIngestor from the monitor configuration
    ///
    /// # Errors
    /// Returns `IngestError::Init` when no token is configured
    pub fn from_config(config: &MonitorConfig) -> Result<Self, IngestError> {
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| IngestError::Init("AXIOM_TOKEN is not set".to_string()))?;

        Self::with_timeout(
            DEFAULT_BASE_URL,
            config.dataset.clone(),
            token,
            config.org_id.clone(),
            config.request_timeout,
        )
    }
}

#[async_trait]
impl Ingestor for AxiomIngestor {
    fn name(&self) -> &'static str {
        "axiom"
    }

    async fn ingest(&self, records: &[TelemetryRecord]) -> Result<(), IngestError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(records);

        if let Some(org_id) = &self.org_id {
            request = request.header(ORG_ID_HEADER, org_id.as_str());
        }

        match request.send().await {
            Ok(response) => {
                if response.status().is_success() {
                    debug!(
                        url = %self.url,
                        count = records.len(),
                        status = %response.status(),
                        "Records ingested"
                    );
                    Ok(())
                } else {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    error!(
                        url = %self.url,
                        status = %status,
                        body = %body,
                        "Ingest request rejected"
                    );
                    Err(IngestError::Send(format!(
                        "Ingest returned {}: {}",
                        status, body
                    )))
                }
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "Ingest connection failed");
                Err(IngestError::Connection(format!(
                    "Failed to reach {}: {}",
                    self.url, e
                )))
            }
        }
    }
}
