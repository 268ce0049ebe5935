//! Status polling task.
//!
//! While a job is processing, the service is queried on a fixed cadence
//! until a terminal status is observed or the job's token is cancelled. A
//! failed poll is transient by construction: it is logged and the next tick
//! retries. Only an explicit `error` status from a successful response is
//! treated as a job failure.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::controller::JobLifecycleController;

/// Spawn the poll loop for one job.
///
/// The loop stops on its own once a terminal status has been applied, and
/// unconditionally when the job token is cancelled.
pub(crate) fn spawn_status_poller(
    controller: JobLifecycleController,
    token: CancellationToken,
    file_id: String,
) -> JoinHandle<()> {
    let period = Duration::from_millis(controller.timing().status_poll_interval_ms);

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Status poller for {} shutting down", file_id);
                    break;
                }
                _ = ticker.tick() => {
                    let report = controller.service().status(&file_id).await;
                    match report {
                        Ok(report) => {
                            if !controller.apply_status_report(&file_id, report).await {
                                break;
                            }
                        }
                        Err(error) => {
                            // Transient poll error: swallowed, next tick retries.
                            warn!("Status check for {} failed: {}", file_id, error);
                        }
                    }
                }
            }
        }
    })
}
