//! Classification report serialization.
//!
//! Pure formatting with no network dependency: the last-fetched statistics
//! are rendered as a comma-separated text blob with a fixed column layout
//! and offered to the user as a local file.

use crate::domain::stats::ClassificationStats;

const REPORT_TITLE: &str = "CPK Cloud Classifier - Classification Report";

/// Build the CSV report for a completed classification.
///
/// Layout: title, blank line, metadata rows, blank line, the
/// `Class,Points,Percentage` header, one row per class.
pub fn build_csv_report(stats: &ClassificationStats) -> String {
    let mut rows: Vec<String> = vec![
        REPORT_TITLE.to_string(),
        String::new(),
        format!("File ID,{}", stats.file_id),
        format!("Total Points,{}", stats.total_points),
        format!("Input File Size (MB),{}", stats.input_file_size_mb),
        format!("Output File Size (MB),{}", stats.output_file_size_mb),
        String::new(),
        "Class,Points,Percentage".to_string(),
    ];
    rows.extend(
        stats
            .classes
            .iter()
            .map(|class| format!("{},{},{}%", class.name, class.points, class.percentage)),
    );
    rows.join("\n")
}

/// Default file name offered for the report download.
pub fn report_file_name(stats: &ClassificationStats) -> String {
    format!("{}_report.csv", stats.file_id)
}
