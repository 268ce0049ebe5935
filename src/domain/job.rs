//! Job entity and lifecycle view state.
//!
//! A `Job` is one server-side classification run identified by an opaque id
//! issued by the upload endpoint. Jobs live only for the current client
//! session; there is no persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::constants::upload::SUPPORTED_EXTENSIONS;

/// Top-level view state consumed by the rendering layer.
///
/// Exactly one variant is active at any time. Errors are not a state; they
/// ride along as a dismissible message on whichever state is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UiState {
    /// No job; the submission surface is shown.
    Upload,
    /// A job is active; poller and animator are running.
    Processing,
    /// Statistics were fetched; terminal until an explicit reset.
    Results,
}

impl std::fmt::Display for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UiState::Upload => write!(f, "upload"),
            UiState::Processing => write!(f, "processing"),
            UiState::Results => write!(f, "results"),
        }
    }
}

/// Job status as reported by the status endpoint.
///
/// The service is free to report intermediate statuses the client does not
/// know about (`processing`, `queued`, ...); everything that is not
/// `completed` or `error` keeps the poll loop running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Running,
    Completed,
    Error,
    #[serde(other)]
    Pending,
}

impl ServerStatus {
    /// Terminal statuses stop the poll loop.
    pub fn is_terminal(self) -> bool {
        matches!(self, ServerStatus::Completed | ServerStatus::Error)
    }
}

/// One server-side classification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Job {
    /// Opaque identifier issued by the upload endpoint.
    pub file_id: String,
    /// Name of the submitted file, as selected by the user.
    pub file_name: String,
    /// Size of the submitted payload in bytes.
    pub file_size_bytes: u64,
    /// When the upload succeeded.
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(file_id: String, file_name: String, file_size_bytes: u64) -> Self {
        Self {
            file_id,
            file_name,
            file_size_bytes,
            submitted_at: Utc::now(),
        }
    }
}

/// Case-sensitive extension gate applied before any upload is attempted.
pub fn is_supported_file_name(file_name: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|extension| file_name.ends_with(extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_extensions() {
        assert!(is_supported_file_name("survey.las"));
        assert!(is_supported_file_name("survey.laz"));
    }

    #[test]
    fn rejects_unknown_and_uppercase_extensions() {
        assert!(!is_supported_file_name("survey.xyz"));
        assert!(!is_supported_file_name("survey.LAS"));
        assert!(!is_supported_file_name("las"));
        assert!(!is_supported_file_name(""));
    }

    #[test]
    fn unknown_server_status_is_not_terminal() {
        let status: ServerStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(status, ServerStatus::Pending);
        assert!(!status.is_terminal());

        let status: ServerStatus = serde_json::from_str("\"completed\"").unwrap();
        assert!(status.is_terminal());
    }
}
