//! Job lifecycle controller.
//!
//! Owns the `upload -> processing -> results` state machine, sequences the
//! upload submitter, status poller, progress animator and results fetcher,
//! and exposes serializable snapshots plus an event stream to the rendering
//! layer.
//!
//! All mutations are serialized behind a single async lock. The two
//! recurring timers report into the controller and never touch state
//! directly; they are owned by a job-scoped cancellation token that is a
//! child of the controller-scoped one, so both a job exit and a controller
//! teardown release them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::application::animator::spawn_progress_animator;
use crate::application::events::EventEmitter;
use crate::application::poller::spawn_status_poller;
use crate::domain::constants::{messages, progress};
use crate::domain::events::ClientEvent;
use crate::domain::job::{is_supported_file_name, Job, ServerStatus, UiState};
use crate::domain::pipeline::{default_steps, project_steps, PipelineStep};
use crate::domain::services::{
    ClassificationService, ServiceError, StatusReport, UploadRequest,
};
use crate::domain::stats::ClassificationStats;
use crate::infrastructure::config::TimingConfig;

/// Failures of the controller's public operations.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("unsupported file name: {0}")]
    UnsupportedFile(String),

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("a job is already active")]
    JobAlreadyActive,

    #[error("no active job")]
    NoActiveJob,

    #[error("results are not ready yet ({progress:.0}%)")]
    NotReady { progress: f64 },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Serializable view of the controller state, consumed by the rendering
/// layer on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StateSnapshot {
    pub ui: UiState,
    pub job: Option<Job>,
    pub progress: f64,
    pub steps: Vec<PipelineStep>,
    /// True once the service reported the job as completed.
    pub server_complete: bool,
    /// True once the results affordance should be unlocked.
    pub results_ready: bool,
    /// Dismissible user-visible error message, if any.
    pub error: Option<String>,
    pub stats: Option<ClassificationStats>,
}

#[derive(Debug)]
struct ControllerState {
    ui: UiState,
    job: Option<Job>,
    progress: f64,
    steps: Vec<PipelineStep>,
    server_complete: bool,
    error: Option<String>,
    stats: Option<ClassificationStats>,
    upload_in_flight: bool,
    job_token: Option<CancellationToken>,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            ui: UiState::Upload,
            job: None,
            progress: 0.0,
            steps: default_steps(),
            server_complete: false,
            error: None,
            stats: None,
            upload_in_flight: false,
            job_token: None,
        }
    }

    fn is_active_job(&self, file_id: &str) -> bool {
        self.job
            .as_ref()
            .is_some_and(|job| job.file_id == file_id)
    }

    /// Discard the job and everything derived from it. Keeps `error` and
    /// `ui` untouched; the caller decides those.
    fn discard_job(&mut self) -> Option<CancellationToken> {
        self.job = None;
        self.progress = 0.0;
        self.steps = default_steps();
        self.server_complete = false;
        self.stats = None;
        self.job_token.take()
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            ui: self.ui,
            job: self.job.clone(),
            progress: self.progress,
            steps: self.steps.clone(),
            server_complete: self.server_complete,
            results_ready: self.ui == UiState::Processing
                && self.progress >= progress::READY_THRESHOLD,
            error: self.error.clone(),
            stats: self.stats.clone(),
        }
    }
}

struct ControllerInner {
    state: RwLock<ControllerState>,
    service: Arc<dyn ClassificationService>,
    emitter: EventEmitter,
    timing: TimingConfig,
    shutdown: CancellationToken,
}

/// The lifecycle controller. Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct JobLifecycleController {
    inner: Arc<ControllerInner>,
}

impl JobLifecycleController {
    pub fn new(service: Arc<dyn ClassificationService>, timing: TimingConfig) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                state: RwLock::new(ControllerState::new()),
                service,
                emitter: EventEmitter::new(),
                timing,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub(crate) fn service(&self) -> &Arc<dyn ClassificationService> {
        &self.inner.service
    }

    pub(crate) fn timing(&self) -> &TimingConfig {
        &self.inner.timing
    }

    /// Subscribe to the controller's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.emitter.subscribe()
    }

    /// Current state, for pull-based consumers.
    pub async fn snapshot(&self) -> StateSnapshot {
        self.inner.state.read().await.snapshot()
    }

    /// Dismiss the current error message, if any.
    pub async fn dismiss_error(&self) {
        self.inner.state.write().await.error = None;
    }

    /// URL of the classified output for the active job, for
    /// navigation-triggered download.
    pub async fn download_url(&self) -> Option<String> {
        let state = self.inner.state.read().await;
        state
            .job
            .as_ref()
            .map(|job| self.inner.service.download_url(&job.file_id))
    }

    /// Submit a file to the service and, on success, enter the processing
    /// state with a fresh job.
    ///
    /// Rejects concurrent submissions and anything that is not a recognized
    /// point-cloud file. A failed upload reports once and leaves the view
    /// in `upload`; there is no automatic retry.
    pub async fn submit(
        &self,
        file_name: &str,
        payload: Vec<u8>,
    ) -> Result<String, ControllerError> {
        if !is_supported_file_name(file_name) {
            return Err(ControllerError::UnsupportedFile(file_name.to_string()));
        }

        let file_size_bytes = payload.len() as u64;
        {
            let mut state = self.inner.state.write().await;
            if state.upload_in_flight {
                return Err(ControllerError::SubmissionInFlight);
            }
            if state.ui != UiState::Upload {
                return Err(ControllerError::JobAlreadyActive);
            }
            state.upload_in_flight = true;
        }

        info!("Uploading {} ({} bytes)", file_name, file_size_bytes);
        self.inner.emitter.emit_upload_started(file_name).await;

        let result = self
            .inner
            .service
            .upload(UploadRequest {
                file_name: file_name.to_string(),
                payload,
            })
            .await;

        let mut state = self.inner.state.write().await;
        state.upload_in_flight = false;

        match result {
            Ok(receipt) => {
                let file_id = receipt.file_id;
                info!("Upload accepted, job {}", file_id);

                state.job = Some(Job::new(
                    file_id.clone(),
                    file_name.to_string(),
                    file_size_bytes,
                ));
                state.progress = 0.0;
                state.steps = default_steps();
                state.server_complete = false;
                state.error = None;
                state.stats = None;

                let from = state.ui;
                state.ui = UiState::Processing;

                let job_token = self.inner.shutdown.child_token();
                state.job_token = Some(job_token.clone());
                drop(state);

                self.inner
                    .emitter
                    .emit_upload_completed(&file_id, file_name)
                    .await;
                self.inner
                    .emitter
                    .emit_state_change(from, UiState::Processing)
                    .await;

                spawn_status_poller(self.clone(), job_token.clone(), file_id.clone());
                spawn_progress_animator(self.clone(), job_token, file_id.clone());

                Ok(file_id)
            }
            Err(error) => {
                let message = error.user_message(messages::UPLOAD_FAILED);
                warn!("Upload of {} failed: {}", file_name, error);
                state.error = Some(message.clone());
                drop(state);

                self.inner.emitter.emit_error(message, true).await;
                Err(error.into())
            }
        }
    }

    /// Fetch final statistics for the active job and transition to the
    /// results state.
    ///
    /// Gated on the displayed progress having reached the ready threshold.
    /// On failure the view stays in `processing` and the user may retry; on
    /// success the progress estimate is forced to exactly 100 and the
    /// job's timers are released.
    pub async fn fetch_results(&self) -> Result<ClassificationStats, ControllerError> {
        let file_id = {
            let state = self.inner.state.read().await;
            if state.ui == UiState::Results {
                // Repeated invocation after success is a no-op.
                if let Some(stats) = &state.stats {
                    return Ok(stats.clone());
                }
            }
            if state.ui != UiState::Processing {
                return Err(ControllerError::NoActiveJob);
            }
            let job = state.job.as_ref().ok_or(ControllerError::NoActiveJob)?;
            if state.progress < progress::READY_THRESHOLD {
                return Err(ControllerError::NotReady {
                    progress: state.progress,
                });
            }
            job.file_id.clone()
        };

        debug!("Fetching results for {}", file_id);
        let result = self.inner.service.stats(&file_id).await;

        let mut state = self.inner.state.write().await;
        // Stale-response guard: the job may have been reset or replaced
        // while the request was in flight.
        if state.ui != UiState::Processing || !state.is_active_job(&file_id) {
            debug!("Discarding stats response for stale job {}", file_id);
            return Err(ControllerError::NoActiveJob);
        }

        match result {
            Ok(stats) => {
                if stats.file_id != file_id {
                    let message = messages::STATS_FETCH_FAILED.to_string();
                    warn!(
                        "Stats response for {} carried mismatched id {}",
                        file_id, stats.file_id
                    );
                    state.error = Some(message.clone());
                    drop(state);
                    self.inner.emitter.emit_error(message.clone(), true).await;
                    return Err(ServiceError::MalformedResponse(message).into());
                }

                info!("Results ready for {}", file_id);
                let token = state.job_token.take();
                state.stats = Some(stats.clone());
                state.progress = progress::COMPLETE;
                state.steps = project_steps(progress::COMPLETE);
                state.server_complete = true;
                state.error = None;
                let from = state.ui;
                state.ui = UiState::Results;
                let steps = state.steps.clone();
                drop(state);

                if let Some(token) = token {
                    token.cancel();
                }

                self.inner
                    .emitter
                    .emit_progress(&file_id, progress::COMPLETE, true)
                    .await;
                self.inner.emitter.emit_stage_update(&file_id, steps).await;
                self.inner.emitter.emit_stats_loaded(stats.clone()).await;
                self.inner
                    .emitter
                    .emit_state_change(from, UiState::Results)
                    .await;

                Ok(stats)
            }
            Err(error) => {
                let message = error.user_message(messages::STATS_FETCH_FAILED);
                warn!("Stats fetch for {} failed: {}", file_id, error);
                state.error = Some(message.clone());
                drop(state);

                self.inner.emitter.emit_error(message, true).await;
                Err(error.into())
            }
        }
    }

    /// Explicit user reset: discard the job and all derived data and return
    /// to the upload state.
    pub async fn reset(&self) {
        let mut state = self.inner.state.write().await;
        let token = state.discard_job();
        state.error = None;
        let from = state.ui;
        state.ui = UiState::Upload;
        drop(state);

        if let Some(token) = token {
            token.cancel();
        }
        if from != UiState::Upload {
            info!("Reset from {} to upload", from);
            self.inner
                .emitter
                .emit_state_change(from, UiState::Upload)
                .await;
        }
    }

    /// Tear the controller down. Cancels every job-scoped timer; no state
    /// mutation happens afterwards.
    pub async fn shutdown(&self) {
        debug!("Controller shutting down");
        self.inner.shutdown.cancel();
        let mut state = self.inner.state.write().await;
        state.job_token = None;
    }

    /// Apply one animation tick. Called by the animator task only.
    ///
    /// No-ops once the estimate has reached the simulated cap, once the
    /// service reported completion (the estimate is frozen at terminal
    /// server states), and for any job that is no longer active.
    pub(crate) async fn apply_progress_tick(&self, file_id: &str, increment: f64) {
        let mut state = self.inner.state.write().await;
        if state.ui != UiState::Processing || !state.is_active_job(file_id) {
            return;
        }
        if state.server_complete || state.progress >= progress::SIMULATED_CAP {
            return;
        }

        state.progress = (state.progress + increment.max(0.0)).min(progress::SIMULATED_CAP);
        let percentage = state.progress;
        let steps = project_steps(percentage);
        let steps_changed = steps != state.steps;
        state.steps = steps.clone();
        drop(state);

        self.inner
            .emitter
            .emit_progress(file_id, percentage, false)
            .await;
        if steps_changed {
            self.inner.emitter.emit_stage_update(file_id, steps).await;
        }
    }

    /// Apply one status report. Called by the poller task only. Returns
    /// whether polling should continue.
    pub(crate) async fn apply_status_report(&self, file_id: &str, report: StatusReport) -> bool {
        let mut state = self.inner.state.write().await;
        if state.ui != UiState::Processing || !state.is_active_job(file_id) {
            return false;
        }

        match report.status {
            ServerStatus::Completed => {
                info!("Service reports {} completed", file_id);
                state.server_complete = true;
                // Open the results gate; the animator is frozen from here
                // and the final jump to 100 belongs to the results fetch.
                if state.progress < progress::READY_THRESHOLD {
                    state.progress = progress::READY_THRESHOLD;
                    state.steps = project_steps(state.progress);
                }
                let percentage = state.progress;
                let steps = state.steps.clone();
                drop(state);

                self.inner
                    .emitter
                    .emit_progress(file_id, percentage, true)
                    .await;
                self.inner.emitter.emit_stage_update(file_id, steps).await;
                self.inner.emitter.emit_server_completed(file_id).await;
                false
            }
            ServerStatus::Error => {
                let message = report
                    .error
                    .unwrap_or_else(|| messages::CLASSIFICATION_FAILED.to_string());
                warn!("Job {} failed: {}", file_id, message);

                let token = state.discard_job();
                state.error = Some(message.clone());
                let from = state.ui;
                state.ui = UiState::Upload;
                drop(state);

                if let Some(token) = token {
                    token.cancel();
                }
                self.inner.emitter.emit_error(message, false).await;
                self.inner
                    .emitter
                    .emit_state_change(from, UiState::Upload)
                    .await;
                false
            }
            ServerStatus::Running | ServerStatus::Pending => true,
        }
    }
}
