//! Ingestion backends for VASTE
//!
//! An [`Ingestor`] forwards telemetry records to a remote backend. The
//! delivery client drives it one record at a time; the slice signature
//! exists because the backend API takes a list, never because submissions
//! are batched.

pub mod axiom;
pub mod stdout;

use crate::error::IngestError;
use crate::record::TelemetryRecord;
use async_trait::async_trait;

pub use axiom::AxiomIngestor;
pub use stdout::StdoutIngestor;

/// Ingestor trait - sends telemetry records to a backend
///
/// # Example
///
/// ```ignore
/// struct MyBackendIngestor {
///     client: MyApiClient,
/// }
///
/// #[async_trait]
/// impl Ingestor for MyBackendIngestor {
///     fn name(&self) -> &'static str { "my-backend" }
///
///     async fn ingest(&self, records: &[TelemetryRecord]) -> Result<(), IngestError> {
///         self.client.submit(records).await?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Ingestor: Send + Sync {
    /// Ingestor name for identification and logging
    fn name(&self) -> &'static str;

    /// Submit records to the backend
    ///
    /// # Returns
    /// Ok(()) on success, IngestError on any transport or API failure
    async fn ingest(&self, records: &[TelemetryRecord]) -> Result<(), IngestError>;
}
