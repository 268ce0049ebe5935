//! Domain module - core entities and contracts of the classification client
//!
//! This module contains the job entity, pipeline stage projection, event
//! types and the service capability contract that the application layer
//! coordinates.

pub mod constants;
pub mod events;
pub mod job;
pub mod pipeline;
pub mod services;
pub mod stats;

// Re-export commonly used items
pub use events::{ClientEvent, ProgressUpdate};
pub use job::{Job, ServerStatus, UiState};
pub use pipeline::{PipelineStep, StepStatus};
pub use services::{ClassificationService, ServiceError, StatusReport, UploadReceipt, UploadRequest};
pub use stats::{ClassSummary, ClassificationStats};
