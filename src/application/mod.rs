//! Application layer - lifecycle coordination for the classification client
//!
//! Contains the job lifecycle controller, its two background tasks (status
//! poller, progress animator), the event emitter and the report builder.

pub mod animator;
pub mod controller;
pub mod events;
pub mod poller;
pub mod report;

// Re-export commonly used items
pub use controller::{ControllerError, JobLifecycleController, StateSnapshot};
pub use events::EventEmitter;
pub use report::{build_csv_report, report_file_name};
