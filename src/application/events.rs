//! Event emission to the rendering layer.
//!
//! The controller publishes every observable change on a broadcast channel;
//! any number of consumers (UI bridge, CLI printer, tests) can subscribe.
//! Emission is fire-and-forget: a send with no subscribers is not an error.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::domain::events::{ClientEvent, ProgressUpdate};
use crate::domain::job::UiState;
use crate::domain::pipeline::PipelineStep;
use crate::domain::stats::ClassificationStats;

/// Default broadcast buffer. Slow subscribers lag rather than block the
/// controller.
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Broadcast-based event emitter.
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<ClientEvent>,
    enabled: Arc<RwLock<bool>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            enabled: Arc::new(RwLock::new(true)),
        }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    /// Enable or disable emission.
    pub async fn set_enabled(&self, enabled: bool) {
        let mut guard = self.enabled.write().await;
        *guard = enabled;
        debug!("Event emission {}", if enabled { "enabled" } else { "disabled" });
    }

    pub async fn is_enabled(&self) -> bool {
        *self.enabled.read().await
    }

    /// Emit a single event.
    pub async fn emit(&self, event: ClientEvent) {
        if !self.is_enabled().await {
            return;
        }

        let event_name = event.event_name();
        match self.sender.send(event) {
            Ok(subscribers) => {
                debug!("Emitted {} to {} subscriber(s)", event_name, subscribers);
            }
            Err(_) => {
                debug!("No subscribers for {}", event_name);
            }
        }
    }

    pub async fn emit_state_change(&self, from: UiState, to: UiState) {
        self.emit(ClientEvent::StateChange {
            from,
            to,
            timestamp: Utc::now(),
        })
        .await;
    }

    pub async fn emit_upload_started(&self, file_name: &str) {
        self.emit(ClientEvent::UploadStarted {
            file_name: file_name.to_string(),
            timestamp: Utc::now(),
        })
        .await;
    }

    pub async fn emit_upload_completed(&self, file_id: &str, file_name: &str) {
        self.emit(ClientEvent::UploadCompleted {
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            timestamp: Utc::now(),
        })
        .await;
    }

    pub async fn emit_progress(&self, file_id: &str, percentage: f64, server_complete: bool) {
        self.emit(ClientEvent::ProgressUpdate(ProgressUpdate {
            file_id: file_id.to_string(),
            percentage,
            server_complete,
            timestamp: Utc::now(),
        }))
        .await;
    }

    pub async fn emit_stage_update(&self, file_id: &str, steps: Vec<PipelineStep>) {
        self.emit(ClientEvent::StageUpdate {
            file_id: file_id.to_string(),
            steps,
        })
        .await;
    }

    pub async fn emit_server_completed(&self, file_id: &str) {
        self.emit(ClientEvent::ServerCompleted {
            file_id: file_id.to_string(),
            timestamp: Utc::now(),
        })
        .await;
    }

    pub async fn emit_stats_loaded(&self, stats: ClassificationStats) {
        self.emit(ClientEvent::StatsLoaded(stats)).await;
    }

    pub async fn emit_error(&self, message: String, recoverable: bool) {
        self.emit(ClientEvent::Error {
            error_id: Uuid::new_v4().to_string(),
            message,
            recoverable,
            timestamp: Utc::now(),
        })
        .await;
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
