//! Simulated classification service.
//!
//! In-process provider of the service contract, used as the development
//! mode of the client binary and as the test double for the controller.
//! Responses are scripted: status reports are consumed from a queue whose
//! last entry is sticky, and single-shot failures can be injected for the
//! upload and stats endpoints.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::job::ServerStatus;
use crate::domain::services::{
    ClassificationService, ServiceError, ServiceHealth, StatusReport, UploadReceipt,
    UploadRequest,
};
use crate::domain::stats::{ClassSummary, ClassificationStats};

#[derive(Debug)]
struct SimState {
    next_upload_error: Option<ServiceError>,
    status_script: VecDeque<Result<StatusReport, ServiceError>>,
    next_stats_error: Option<ServiceError>,
    stats_template: ClassificationStats,
    upload_delay: Duration,
    stats_delay: Duration,
    upload_seq: u32,
}

/// Scripted in-process service provider.
pub struct SimulatedClassificationService {
    state: Mutex<SimState>,
    upload_calls: AtomicUsize,
    status_calls: AtomicUsize,
    stats_calls: AtomicUsize,
}

impl SimulatedClassificationService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                next_upload_error: None,
                status_script: VecDeque::new(),
                next_stats_error: None,
                stats_template: sample_stats("sim"),
                upload_delay: Duration::ZERO,
                stats_delay: Duration::ZERO,
                upload_seq: 0,
            }),
            upload_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            stats_calls: AtomicUsize::new(0),
        }
    }

    /// A service whose job reports `running` for the given number of polls
    /// and `completed` from then on.
    pub fn completing_after(polls: usize) -> Self {
        let service = Self::new();
        for _ in 0..polls {
            service.push_status(Ok(StatusReport {
                status: ServerStatus::Running,
                error: None,
            }));
        }
        service.push_status(Ok(StatusReport {
            status: ServerStatus::Completed,
            error: None,
        }));
        service
    }

    /// Append a scripted status response. The last entry repeats forever.
    pub fn push_status(&self, response: Result<StatusReport, ServiceError>) {
        self.lock().status_script.push_back(response);
    }

    /// Fail the next upload with the given server message.
    pub fn fail_next_upload(&self, message: &str) {
        self.lock().next_upload_error = Some(ServiceError::Rejected {
            message: message.to_string(),
        });
    }

    /// Fail the next stats fetch with the given server message.
    pub fn fail_next_stats(&self, message: &str) {
        self.lock().next_stats_error = Some(ServiceError::Rejected {
            message: message.to_string(),
        });
    }

    /// Replace the statistics template returned on success. The `file_id`
    /// field is overwritten with the requested job id on each fetch.
    pub fn set_stats_template(&self, stats: ClassificationStats) {
        self.lock().stats_template = stats;
    }

    /// Delay upload responses, for exercising the in-flight guard.
    pub fn set_upload_delay(&self, delay: Duration) {
        self.lock().upload_delay = delay;
    }

    /// Delay stats responses, for exercising the stale-response guard.
    pub fn set_stats_delay(&self, delay: Duration) {
        self.lock().stats_delay = delay;
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SimulatedClassificationService {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics used by the simulated provider and the development mode.
pub fn sample_stats(file_id: &str) -> ClassificationStats {
    ClassificationStats {
        file_id: file_id.to_string(),
        total_points: 1000,
        input_file_size_mb: 2.5,
        output_file_size_mb: 1.1,
        classes: vec![
            ClassSummary {
                id: 2,
                name: "Ground".to_string(),
                points: 600,
                percentage: 60.0,
            },
            ClassSummary {
                id: 9,
                name: "Water".to_string(),
                points: 400,
                percentage: 40.0,
            },
        ],
    }
}

#[async_trait]
impl ClassificationService for SimulatedClassificationService {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, ServiceError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        let (delay, result) = {
            let mut state = self.lock();
            let delay = state.upload_delay;
            let result = match state.next_upload_error.take() {
                Some(error) => Err(error),
                None => {
                    state.upload_seq += 1;
                    Ok(UploadReceipt {
                        file_id: format!("sim-job-{:04}", state.upload_seq),
                        message: Some("File uploaded and classification started".to_string()),
                        input_file: Some(request.file_name.clone()),
                        output_file: None,
                        file_size_mb: Some(request.payload.len() as f64 / 1024.0 / 1024.0),
                    })
                }
            };
            (delay, result)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn status(&self, _file_id: &str) -> Result<StatusReport, ServiceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.lock();
        if state.status_script.len() > 1 {
            state.status_script.pop_front().unwrap_or(Ok(StatusReport {
                status: ServerStatus::Running,
                error: None,
            }))
        } else {
            state.status_script.front().cloned().unwrap_or(Ok(StatusReport {
                status: ServerStatus::Running,
                error: None,
            }))
        }
    }

    async fn stats(&self, file_id: &str) -> Result<ClassificationStats, ServiceError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);

        let (delay, result) = {
            let mut state = self.lock();
            let delay = state.stats_delay;
            let result = match state.next_stats_error.take() {
                Some(error) => Err(error),
                None => {
                    let mut stats = state.stats_template.clone();
                    stats.file_id = file_id.to_string();
                    Ok(stats)
                }
            };
            (delay, result)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn health(&self) -> Result<ServiceHealth, ServiceError> {
        Ok(ServiceHealth {
            status: "healthy".to_string(),
            service: Some("Simulated Cloud Classifier".to_string()),
        })
    }

    fn download_url(&self, file_id: &str) -> String {
        format!("sim://classifier/api/download/{file_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn status_script_is_sticky_on_its_last_entry() {
        let service = SimulatedClassificationService::completing_after(1);

        let first = service.status("job").await.unwrap();
        assert_eq!(first.status, ServerStatus::Running);

        let second = service.status("job").await.unwrap();
        assert_eq!(second.status, ServerStatus::Completed);

        let third = service.status("job").await.unwrap();
        assert_eq!(third.status, ServerStatus::Completed);
        assert_eq!(service.status_calls(), 3);
    }

    #[tokio::test]
    async fn empty_script_reports_running() {
        let service = SimulatedClassificationService::new();
        let report = service.status("job").await.unwrap();
        assert_eq!(report.status, ServerStatus::Running);
    }

    #[tokio::test]
    async fn upload_issues_sequential_job_ids() {
        let service = SimulatedClassificationService::new();
        let request = UploadRequest {
            file_name: "cloud.las".to_string(),
            payload: vec![0u8; 16],
        };
        let first = service.upload(request.clone()).await.unwrap();
        let second = service.upload(request).await.unwrap();
        assert_ne!(first.file_id, second.file_id);
    }

    #[tokio::test]
    async fn injected_failures_fire_once() {
        let service = SimulatedClassificationService::new();
        service.fail_next_upload("No file provided");

        let request = UploadRequest {
            file_name: "cloud.las".to_string(),
            payload: Vec::new(),
        };
        assert!(service.upload(request.clone()).await.is_err());
        tokio_test::assert_ok!(service.upload(request).await);
    }

    #[tokio::test]
    async fn stats_echo_the_requested_job_id() {
        let service = SimulatedClassificationService::new();
        let stats = service.stats("job-42").await.unwrap();
        assert_eq!(stats.file_id, "job-42");
        assert_eq!(stats.total_points, 1000);
    }
}
