//! Event types emitted to the rendering layer.
//!
//! Every observable state change of the controller is mirrored as an event
//! so the rendering layer can stay a passive consumer. Event payloads are
//! serializable and exported as TypeScript types via ts-rs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::job::UiState;
use crate::domain::pipeline::PipelineStep;
use crate::domain::stats::ClassificationStats;

/// Progress snapshot carried by [`ClientEvent::ProgressUpdate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProgressUpdate {
    pub file_id: String,
    /// Simulated progress estimate, 0..=100.
    pub percentage: f64,
    /// Whether the service has reported the job as completed.
    pub server_complete: bool,
    pub timestamp: DateTime<Utc>,
}

/// Events emitted by the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientEvent {
    /// The view state changed.
    StateChange {
        from: UiState,
        to: UiState,
        timestamp: DateTime<Utc>,
    },

    /// An upload request was accepted by the submission surface and is in
    /// flight.
    UploadStarted {
        file_name: String,
        timestamp: DateTime<Utc>,
    },

    /// The upload endpoint issued a job identifier.
    UploadCompleted {
        file_id: String,
        file_name: String,
        timestamp: DateTime<Utc>,
    },

    /// The progress estimate advanced.
    ProgressUpdate(ProgressUpdate),

    /// The derived stage statuses changed.
    StageUpdate {
        file_id: String,
        steps: Vec<PipelineStep>,
    },

    /// The service reported the job as completed. The view stays in
    /// `processing` until the user requests results.
    ServerCompleted {
        file_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Statistics were fetched and the view moved to `results`.
    StatsLoaded(ClassificationStats),

    /// A user-visible error. `recoverable` distinguishes errors the user can
    /// retry in place from job failures that returned the view to `upload`.
    Error {
        error_id: String,
        message: String,
        recoverable: bool,
        timestamp: DateTime<Utc>,
    },
}

impl ClientEvent {
    /// Event channel name, used as the topic when events are forwarded to a
    /// rendering layer.
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientEvent::StateChange { .. } => "classification-state-change",
            ClientEvent::UploadStarted { .. } => "classification-upload-started",
            ClientEvent::UploadCompleted { .. } => "classification-upload-completed",
            ClientEvent::ProgressUpdate(_) => "classification-progress",
            ClientEvent::StageUpdate { .. } => "classification-stage-update",
            ClientEvent::ServerCompleted { .. } => "classification-server-completed",
            ClientEvent::StatsLoaded(_) => "classification-stats-loaded",
            ClientEvent::Error { .. } => "classification-error",
        }
    }
}
