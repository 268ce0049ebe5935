//! Domain constants for the classification client.
//!
//! Values that are part of the observable client behavior rather than
//! deployment tuning. Deployment tuning lives in `infrastructure::config`.

/// Progress animation policy.
pub mod progress {
    /// Ceiling applied to the simulated progress estimate while the job is
    /// still running. The remaining headroom is consumed by the explicit
    /// results fetch, which forces the estimate to exactly 100.
    pub const SIMULATED_CAP: f64 = 95.0;

    /// Upper bound (exclusive) of the random increment added per tick.
    pub const MAX_TICK_INCREMENT: f64 = 10.0;

    /// Displayed progress at which the results affordance unlocks.
    pub const READY_THRESHOLD: f64 = 95.0;

    /// Final value set once the results fetch succeeds.
    pub const COMPLETE: f64 = 100.0;
}

/// Timer cadences of the two recurring background tasks.
pub mod timing {
    /// Server status poll cadence (milliseconds).
    pub const DEFAULT_STATUS_POLL_INTERVAL_MS: u64 = 2000;

    /// Progress animation cadence (milliseconds).
    pub const DEFAULT_PROGRESS_TICK_INTERVAL_MS: u64 = 1000;
}

/// Submission surface constants.
pub mod upload {
    /// Accepted point-cloud file extensions. The check is case-sensitive,
    /// matching the submission surface of the served frontend.
    pub const SUPPORTED_EXTENSIONS: [&str; 2] = [".las", ".laz"];
}

/// Fallback messages used when the service does not supply one.
pub mod messages {
    pub const UPLOAD_FAILED: &str = "Upload failed";
    pub const CLASSIFICATION_FAILED: &str = "Classification failed";
    pub const STATS_FETCH_FAILED: &str = "Error fetching classification statistics";
}
