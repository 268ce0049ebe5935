//! Pipeline stage descriptors and the progress-to-stage projection.
//!
//! The displayed pipeline is a fixed, ordered list of five stages. Stage
//! statuses are a pure function of the current progress estimate; the
//! projection keeps no state of its own and can be replayed from any
//! estimate value.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Number of stages in the displayed pipeline. Fixed at runtime.
pub const STAGE_COUNT: usize = 5;

/// Stable identifiers and display names of the five pipeline stages.
const STAGE_DESCRIPTORS: [(&str, &str); STAGE_COUNT] = [
    ("1", "Preparing data"),
    ("2", "Tiling"),
    ("3", "Classification"),
    ("4", "Merging"),
    ("5", "Exporting"),
];

/// Derived status of a single pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Waiting,
    Processing,
    Done,
}

/// One stage of the displayed pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PipelineStep {
    pub id: String,
    pub name: String,
    pub status: StepStatus,
}

/// The five stages, all `waiting`. This is the state shown for a freshly
/// created job before the first animation tick.
pub fn default_steps() -> Vec<PipelineStep> {
    STAGE_DESCRIPTORS
        .iter()
        .map(|(id, name)| PipelineStep {
            id: (*id).to_string(),
            name: (*name).to_string(),
            status: StepStatus::Waiting,
        })
        .collect()
}

/// Project a progress estimate onto per-stage statuses.
///
/// Stage `k = floor(progress / (100 / STAGE_COUNT))` is `processing`; stages
/// before it are `done`, stages after it are `waiting`. At progress >= 100
/// every stage is `done`.
pub fn project_steps(progress: f64) -> Vec<PipelineStep> {
    let stage_span = 100.0 / STAGE_COUNT as f64;
    let active_index = (progress.max(0.0) / stage_span).floor() as usize;

    STAGE_DESCRIPTORS
        .iter()
        .enumerate()
        .map(|(index, (id, name))| {
            let status = if progress >= 100.0 || index < active_index {
                StepStatus::Done
            } else if index == active_index {
                StepStatus::Processing
            } else {
                StepStatus::Waiting
            };
            PipelineStep {
                id: (*id).to_string(),
                name: (*name).to_string(),
                status,
            }
        })
        .collect()
}
