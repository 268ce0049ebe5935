//! Headless driver for the classification client.
//!
//! Submits one point-cloud file, follows the job through polling and the
//! progress animation, fetches results on the user's behalf once the
//! service reports completion, and writes the CSV report next to the
//! current directory. `--simulate` runs the same lifecycle against the
//! in-process provider.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use cpk_cloud_client_lib::application::{
    build_csv_report, report_file_name, JobLifecycleController,
};
use cpk_cloud_client_lib::domain::{ClassificationService, ClientEvent, UiState};
use cpk_cloud_client_lib::infrastructure::{
    init_logging, ClientConfig, HttpClassificationService, SimulatedClassificationService,
};

/// How many failed results fetches the driver retries before giving up.
const MAX_FETCH_ATTEMPTS: u32 = 3;

struct CliArgs {
    file: PathBuf,
    server: Option<String>,
    report: Option<PathBuf>,
    simulate: bool,
}

fn usage() -> &'static str {
    "Usage: cpk-cloud-client <file.las|file.laz> [--server URL] [--report PATH] [--simulate]"
}

fn parse_args() -> Result<CliArgs> {
    let mut file = None;
    let mut server = None;
    let mut report = None;
    let mut simulate = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--server" => {
                server = Some(args.next().context("--server requires a URL")?);
            }
            "--report" => {
                report = Some(PathBuf::from(
                    args.next().context("--report requires a path")?,
                ));
            }
            "--simulate" => simulate = true,
            "--help" | "-h" => bail!("{}", usage()),
            other if other.starts_with('-') => bail!("Unknown option {other}\n{}", usage()),
            other => {
                if file.replace(PathBuf::from(other)).is_some() {
                    bail!("Only one input file is supported\n{}", usage());
                }
            }
        }
    }

    Ok(CliArgs {
        file: file.with_context(|| format!("No input file given\n{}", usage()))?,
        server,
        report,
        simulate,
    })
}

fn describe_event(event: &ClientEvent) {
    match event {
        ClientEvent::StateChange { from, to, .. } => info!("State: {} -> {}", from, to),
        ClientEvent::UploadStarted { file_name, .. } => info!("Uploading {}", file_name),
        ClientEvent::UploadCompleted { file_id, .. } => info!("Upload accepted as job {}", file_id),
        ClientEvent::ProgressUpdate(update) => {
            info!("Progress: {:.0}%", update.percentage);
        }
        ClientEvent::StageUpdate { steps, .. } => {
            if let Some(active) = steps
                .iter()
                .find(|step| step.status == cpk_cloud_client_lib::StepStatus::Processing)
            {
                info!("Stage: {}", active.name);
            }
        }
        ClientEvent::ServerCompleted { file_id, .. } => {
            info!("Server finished classifying {}", file_id);
        }
        ClientEvent::StatsLoaded(stats) => {
            info!(
                "Results: {} points across {} classes",
                stats.total_points,
                stats.classes.len()
            );
        }
        ClientEvent::Error { message, .. } => warn!("Error: {}", message),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    let mut config = ClientConfig::load().await?;
    if let Some(server) = &args.server {
        config.service.base_url = server.clone();
    }
    init_logging(&config.logging)?;

    let service: Arc<dyn ClassificationService> = if args.simulate {
        info!("Running against the simulated service");
        Arc::new(SimulatedClassificationService::completing_after(4))
    } else {
        Arc::new(HttpClassificationService::new(&config.service)?)
    };

    let health = service
        .health()
        .await
        .with_context(|| format!("Service unreachable at {}", config.service.base_url))?;
    info!(
        "Service healthy: {}",
        health.service.unwrap_or_else(|| health.status.clone())
    );

    let controller = JobLifecycleController::new(service.clone(), config.timing.clone());

    let mut events = controller.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            describe_event(&event);
        }
    });

    let payload = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let file_name = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .context("Input path has no file name")?;

    controller.submit(&file_name, payload).await?;

    let mut fetch_attempts = 0u32;
    let stats = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, resetting");
                controller.reset().await;
                controller.shutdown().await;
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_millis(500)) => {
                let snapshot = controller.snapshot().await;
                if snapshot.ui == UiState::Upload {
                    controller.shutdown().await;
                    bail!(
                        "Classification failed: {}",
                        snapshot.error.unwrap_or_else(|| "unknown error".to_string())
                    );
                }
                if snapshot.server_complete && snapshot.results_ready {
                    // Acting as the user's "View Results" click.
                    match controller.fetch_results().await {
                        Ok(stats) => break stats,
                        Err(error) => {
                            fetch_attempts += 1;
                            if fetch_attempts >= MAX_FETCH_ATTEMPTS {
                                controller.shutdown().await;
                                bail!("Giving up on results after {fetch_attempts} attempts: {error}");
                            }
                            warn!("Results fetch failed (attempt {}): {}", fetch_attempts, error);
                        }
                    }
                }
            }
        }
    };

    let report_path = args
        .report
        .unwrap_or_else(|| PathBuf::from(report_file_name(&stats)));
    tokio::fs::write(&report_path, build_csv_report(&stats))
        .await
        .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
    info!("Report written to {}", report_path.display());
    info!(
        "Classified file available at {}",
        service.download_url(&stats.file_id)
    );

    controller.shutdown().await;
    Ok(())
}
