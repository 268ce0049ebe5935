//! CPK Cloud Classifier client
//!
//! Client-side job lifecycle control for a remote point-cloud
//! classification service: upload submission, status polling, simulated
//! progress animation, stage projection and user-gated results retrieval,
//! exposed to a rendering layer as snapshots plus an event stream.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the primary surface for consumers
pub use application::{
    build_csv_report, report_file_name, ControllerError, JobLifecycleController, StateSnapshot,
};
pub use domain::{
    ClassSummary, ClassificationService, ClassificationStats, ClientEvent, Job, PipelineStep,
    ServerStatus, ServiceError, StepStatus, UiState,
};
pub use infrastructure::{
    ClientConfig, HttpClassificationService, SimulatedClassificationService, TimingConfig,
};
