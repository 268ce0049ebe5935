//! Infrastructure layer - external collaborators and process concerns
//!
//! Contains the reqwest-backed service client, the scripted simulation
//! provider, configuration loading and logging initialization.

pub mod config;
pub mod http_service;
pub mod logging;
pub mod sim_service;

// Re-export commonly used items
pub use config::{ClientConfig, LoggingConfig, ServiceConfig, TimingConfig};
pub use http_service::HttpClassificationService;
pub use logging::init_logging;
pub use sim_service::SimulatedClassificationService;
