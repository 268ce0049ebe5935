//! Classification statistics returned by the stats endpoint.
//!
//! Immutable once fetched. A reset or a job switch invalidates any
//! previously stored instance.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Per-class summary within a classification run.
///
/// Class ids follow the ASPRS LAS classification table on the server side;
/// the client treats them as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClassSummary {
    pub id: u32,
    pub name: String,
    pub points: u64,
    pub percentage: f64,
}

/// Final statistics for a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClassificationStats {
    pub file_id: String,
    pub total_points: u64,
    pub input_file_size_mb: f64,
    pub output_file_size_mb: f64,
    /// Ordered by point count descending, as produced by the service.
    pub classes: Vec<ClassSummary>,
}
