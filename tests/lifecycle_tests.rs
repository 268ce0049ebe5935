//! Integration tests for the job lifecycle controller.
//!
//! All tests run on a paused tokio clock: sleeping past the timer cadences
//! advances the poller and animator deterministically without real waiting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use cpk_cloud_client_lib::application::JobLifecycleController;
use cpk_cloud_client_lib::domain::job::{ServerStatus, UiState};
use cpk_cloud_client_lib::domain::pipeline::StepStatus;
use cpk_cloud_client_lib::domain::services::{ServiceError, StatusReport};
use cpk_cloud_client_lib::domain::ClientEvent;
use cpk_cloud_client_lib::infrastructure::{SimulatedClassificationService, TimingConfig};
use cpk_cloud_client_lib::ControllerError;

fn controller_over(
    service: SimulatedClassificationService,
) -> (JobLifecycleController, Arc<SimulatedClassificationService>) {
    let service = Arc::new(service);
    let controller = JobLifecycleController::new(service.clone(), TimingConfig::default());
    (controller, service)
}

fn drain_events(receiver: &mut broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}

async fn submit_sample(controller: &JobLifecycleController) -> String {
    controller
        .submit("survey.las", vec![0u8; 1024])
        .await
        .expect("upload should succeed")
}

#[tokio::test(start_paused = true)]
async fn completed_status_does_not_change_ui_state() {
    let (controller, service) = controller_over(SimulatedClassificationService::completing_after(2));
    submit_sample(&controller).await;

    // Polls at 2s, 4s (running) and 6s (completed).
    tokio::time::sleep(Duration::from_secs(7)).await;

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.ui, UiState::Processing);
    assert!(snapshot.server_complete);
    assert!(snapshot.results_ready);
    assert_eq!(snapshot.progress, 95.0);
    assert!(snapshot.stats.is_none());

    // Polling stops at the terminal status.
    let polls_at_completion = service.status_calls();
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(service.status_calls(), polls_at_completion);

    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn error_status_forces_upload_and_surfaces_server_message() {
    let service = SimulatedClassificationService::new();
    service.push_status(Ok(StatusReport {
        status: ServerStatus::Running,
        error: None,
    }));
    service.push_status(Ok(StatusReport {
        status: ServerStatus::Error,
        error: Some("disk full".to_string()),
    }));
    let (controller, service) = controller_over(service);
    submit_sample(&controller).await;

    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.ui, UiState::Upload);
    assert_eq!(snapshot.error.as_deref(), Some("disk full"));
    assert!(snapshot.job.is_none());
    assert_eq!(snapshot.progress, 0.0);

    // Both timers were torn down with the job.
    let polls_at_failure = service.status_calls();
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(service.status_calls(), polls_at_failure);
}

#[tokio::test(start_paused = true)]
async fn transient_poll_failures_are_swallowed() {
    let service = SimulatedClassificationService::new();
    service.push_status(Err(ServiceError::Network("connection refused".to_string())));
    service.push_status(Err(ServiceError::MalformedResponse("not json".to_string())));
    service.push_status(Ok(StatusReport {
        status: ServerStatus::Completed,
        error: None,
    }));
    let (controller, _service) = controller_over(service);
    submit_sample(&controller).await;

    tokio::time::sleep(Duration::from_secs(7)).await;

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.ui, UiState::Processing);
    assert!(snapshot.server_complete);
    // Transient failures never surface to the user.
    assert!(snapshot.error.is_none());

    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn successful_fetch_transitions_to_results_and_forces_100() {
    let (controller, service) = controller_over(SimulatedClassificationService::completing_after(0));
    let file_id = submit_sample(&controller).await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(controller.snapshot().await.results_ready);

    let stats = controller.fetch_results().await.expect("fetch should succeed");
    assert_eq!(stats.file_id, file_id);

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.ui, UiState::Results);
    assert_eq!(snapshot.progress, 100.0);
    assert!(snapshot
        .steps
        .iter()
        .all(|step| step.status == StepStatus::Done));
    assert_eq!(snapshot.stats.unwrap().file_id, file_id);
    assert_eq!(service.stats_calls(), 1);

    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_stays_in_processing_and_can_be_retried() {
    let (controller, service) = controller_over(SimulatedClassificationService::completing_after(0));
    service.fail_next_stats("File not found or still processing");
    submit_sample(&controller).await;

    tokio::time::sleep(Duration::from_secs(3)).await;

    let result = controller.fetch_results().await;
    assert!(matches!(result, Err(ControllerError::Service(_))));

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.ui, UiState::Processing);
    assert_eq!(
        snapshot.error.as_deref(),
        Some("File not found or still processing")
    );

    // The user retries and succeeds.
    controller.fetch_results().await.expect("retry should succeed");
    assert_eq!(controller.snapshot().await.ui, UiState::Results);
    assert_eq!(service.stats_calls(), 2);

    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn reset_from_results_discards_stats_and_job() {
    let (controller, _service) =
        controller_over(SimulatedClassificationService::completing_after(0));
    submit_sample(&controller).await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    controller.fetch_results().await.expect("fetch should succeed");

    controller.reset().await;

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.ui, UiState::Upload);
    assert!(snapshot.job.is_none());
    assert!(snapshot.stats.is_none());
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.progress, 0.0);
    assert!(snapshot
        .steps
        .iter()
        .all(|step| step.status == StepStatus::Waiting));

    // A fresh submission starts clean, with no stale class data.
    let second_id = submit_sample(&controller).await;
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.ui, UiState::Processing);
    assert!(snapshot.stats.is_none());
    assert_eq!(snapshot.job.unwrap().file_id, second_id);

    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn teardown_leaves_no_pending_timers() {
    let (controller, service) = controller_over(SimulatedClassificationService::new());
    submit_sample(&controller).await;

    // Stop between ticks so no timer callback is in flight at teardown.
    tokio::time::sleep(Duration::from_millis(4500)).await;
    controller.shutdown().await;

    let snapshot_at_teardown = controller.snapshot().await;
    let polls_at_teardown = service.status_calls();

    // Even with fake time advanced well past both cadences, nothing moves.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(controller.snapshot().await, snapshot_at_teardown);
    assert_eq!(service.status_calls(), polls_at_teardown);
}

#[tokio::test(start_paused = true)]
async fn progress_is_monotonic_and_capped_below_completion() {
    let (controller, _service) = controller_over(SimulatedClassificationService::new());
    let mut receiver = controller.subscribe();
    submit_sample(&controller).await;

    tokio::time::sleep(Duration::from_secs(120)).await;
    controller.shutdown().await;

    let mut last = 0.0f64;
    let mut saw_progress = false;
    for event in drain_events(&mut receiver) {
        if let ClientEvent::ProgressUpdate(update) = event {
            saw_progress = true;
            assert!(
                update.percentage >= last,
                "progress regressed from {last} to {}",
                update.percentage
            );
            assert!(update.percentage <= 95.0, "progress exceeded the cap");
            last = update.percentage;
        }
    }
    assert!(saw_progress);
    // 120 ticks of bounded random increments saturate the cap.
    assert_eq!(controller.snapshot().await.progress, 95.0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_submissions_are_rejected_while_one_is_in_flight() {
    let service = SimulatedClassificationService::new();
    service.set_upload_delay(Duration::from_secs(5));
    let (controller, service) = controller_over(service);

    let background = controller.clone();
    let first = tokio::spawn(async move { background.submit("survey.las", vec![0u8; 8]).await });

    // Let the first submission reach the service before trying again.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let second = controller.submit("other.las", vec![0u8; 8]).await;
    assert!(matches!(second, Err(ControllerError::SubmissionInFlight)));

    tokio::time::sleep(Duration::from_secs(6)).await;
    first
        .await
        .expect("task should join")
        .expect("first submission should succeed");
    assert_eq!(controller.snapshot().await.ui, UiState::Processing);
    assert_eq!(service.upload_calls(), 1);

    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn stats_response_for_a_reset_job_is_discarded() {
    let service = SimulatedClassificationService::completing_after(0);
    service.set_stats_delay(Duration::from_secs(5));
    let (controller, _service) = controller_over(service);
    submit_sample(&controller).await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(controller.snapshot().await.results_ready);

    let background = controller.clone();
    let fetch = tokio::spawn(async move { background.fetch_results().await });

    // Let the fetch reach the service, then pull the job out from under it.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    controller.reset().await;

    tokio::time::sleep(Duration::from_secs(6)).await;
    let result = fetch.await.expect("task should join");
    assert!(matches!(result, Err(ControllerError::NoActiveJob)));

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.ui, UiState::Upload);
    assert!(snapshot.stats.is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_upload_requires_a_new_user_submission() {
    let service = SimulatedClassificationService::new();
    service.fail_next_upload("Invalid file format. Only LAS/LAZ supported");
    let (controller, service) = controller_over(service);

    let result = controller.submit("survey.las", vec![0u8; 8]).await;
    assert!(matches!(result, Err(ControllerError::Service(_))));
    assert_eq!(controller.snapshot().await.ui, UiState::Upload);

    // No automatic retry happened.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(service.upload_calls(), 1);

    // A fresh user-initiated submission goes through.
    submit_sample(&controller).await;
    assert_eq!(controller.snapshot().await.ui, UiState::Processing);
    assert_eq!(service.upload_calls(), 2);

    controller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn state_change_events_trace_the_lifecycle() {
    let (controller, _service) =
        controller_over(SimulatedClassificationService::completing_after(0));
    let mut receiver = controller.subscribe();

    submit_sample(&controller).await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    controller.fetch_results().await.expect("fetch should succeed");
    controller.reset().await;
    controller.shutdown().await;

    let transitions: Vec<(UiState, UiState)> = drain_events(&mut receiver)
        .into_iter()
        .filter_map(|event| match event {
            ClientEvent::StateChange { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();

    assert_eq!(
        transitions,
        vec![
            (UiState::Upload, UiState::Processing),
            (UiState::Processing, UiState::Results),
            (UiState::Results, UiState::Upload),
        ]
    );
}
