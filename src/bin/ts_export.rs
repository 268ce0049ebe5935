//! TypeScript type generation for the rendering layer.

use cpk_cloud_client_lib::application::StateSnapshot;
use cpk_cloud_client_lib::domain::events::{ClientEvent, ProgressUpdate};
use cpk_cloud_client_lib::domain::job::{Job, UiState};
use cpk_cloud_client_lib::domain::pipeline::{PipelineStep, StepStatus};
use cpk_cloud_client_lib::domain::stats::{ClassSummary, ClassificationStats};

fn main() {
    use ts_rs::TS;

    println!("UiState TS: {}", UiState::name());
    println!("Job TS: {}", Job::name());
    println!("StepStatus TS: {}", StepStatus::name());
    println!("PipelineStep TS: {}", PipelineStep::name());
    println!("ClassSummary TS: {}", ClassSummary::name());
    println!("ClassificationStats TS: {}", ClassificationStats::name());
    println!("ProgressUpdate TS: {}", ProgressUpdate::name());
    println!("ClientEvent TS: {}", ClientEvent::name());
    println!("StateSnapshot TS: {}", StateSnapshot::name());

    if let Err(e) = UiState::export() {
        eprintln!("UiState export error: {e}");
    }
    if let Err(e) = Job::export() {
        eprintln!("Job export error: {e}");
    }
    if let Err(e) = StepStatus::export() {
        eprintln!("StepStatus export error: {e}");
    }
    if let Err(e) = PipelineStep::export() {
        eprintln!("PipelineStep export error: {e}");
    }
    if let Err(e) = ClassSummary::export() {
        eprintln!("ClassSummary export error: {e}");
    }
    if let Err(e) = ClassificationStats::export() {
        eprintln!("ClassificationStats export error: {e}");
    }
    if let Err(e) = ProgressUpdate::export() {
        eprintln!("ProgressUpdate export error: {e}");
    }
    if let Err(e) = ClientEvent::export() {
        eprintln!("ClientEvent export error: {e}");
    }
    if let Err(e) = StateSnapshot::export() {
        eprintln!("StateSnapshot export error: {e}");
    }

    println!("TypeScript definitions exported");
}
