//! Capability contract for the remote classification service.
//!
//! The controller, poller and results fetcher consume this trait only; the
//! reqwest-backed network client and the in-process simulated client are
//! interchangeable providers behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::job::ServerStatus;
use crate::domain::stats::ClassificationStats;

/// A file submission handed to the upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub payload: Vec<u8>,
}

/// Success body of the upload endpoint. Only `file_id` is load-bearing; the
/// remaining fields are informational echoes from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub file_id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub input_file: Option<String>,
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub file_size_mb: Option<f64>,
}

/// Body of the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: ServerStatus,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

/// Failures at the service boundary.
///
/// `Rejected` carries the server-supplied message verbatim; the other
/// variants are converted into generic user-facing messages by the
/// controller per the error taxonomy.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The service answered with a non-2xx status and an error body.
    #[error("service rejected the request: {message}")]
    Rejected { message: String },

    /// The request never produced a usable response.
    #[error("network error: {0}")]
    Network(String),

    /// The response arrived but its body did not match the contract.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    /// The message shown to the user: the server-supplied one when present,
    /// the given fallback otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ServiceError::Rejected { message } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// The remote classification service as seen by the client.
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Transmit a file as a single multipart request. No automatic retry; a
    /// failed upload requires a fresh user-initiated submission.
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, ServiceError>;

    /// Query the current status of a job.
    async fn status(&self, file_id: &str) -> Result<StatusReport, ServiceError>;

    /// Fetch final statistics for a completed job. Safe to invoke
    /// repeatedly; the caller acts only on the latest response.
    async fn stats(&self, file_id: &str) -> Result<ClassificationStats, ServiceError>;

    /// Liveness probe.
    async fn health(&self) -> Result<ServiceHealth, ServiceError>;

    /// URL of the classified output, for navigation-triggered download. The
    /// payload is never fetched into client memory.
    fn download_url(&self, file_id: &str) -> String;
}
