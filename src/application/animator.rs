//! Progress animation task.
//!
//! The service reports no fractional progress, so the client advances a
//! locally-owned estimate on a fixed cadence to keep the view visibly
//! alive. The estimate is a monotonic illusion, not a measurement: it caps
//! below 100 and the explicit results fetch supplies the final jump.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::controller::JobLifecycleController;
use crate::domain::constants::progress::MAX_TICK_INCREMENT;

/// Spawn the animation loop for one job.
///
/// The loop lives exactly as long as the job's cancellation token; the
/// controller cancels it on any exit from the processing state.
pub(crate) fn spawn_progress_animator(
    controller: JobLifecycleController,
    token: CancellationToken,
    file_id: String,
) -> JoinHandle<()> {
    let period = Duration::from_millis(controller.timing().progress_tick_interval_ms);

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Progress animator for {} shutting down", file_id);
                    break;
                }
                _ = ticker.tick() => {
                    let increment = fastrand::f64() * MAX_TICK_INCREMENT;
                    controller.apply_progress_tick(&file_id, increment).await;
                }
            }
        }
    })
}
