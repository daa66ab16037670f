//! Export metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const EXPORTS_TOTAL: &str = "hoopclip_exports_total";
    pub const EXPORT_DURATION_SECONDS: &str = "hoopclip_export_duration_seconds";
    pub const CLIPS_SKIPPED_TOTAL: &str = "hoopclip_clips_skipped_total";
    pub const UPLOADS_STAGED_TOTAL: &str = "hoopclip_uploads_staged_total";
}

/// Record a finished export attempt.
pub fn record_export(artifact: &str, outcome: &str, duration_secs: f64) {
    let labels = [
        ("artifact", artifact.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::EXPORTS_TOTAL, &labels).increment(1);
    histogram!(names::EXPORT_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a clip left out of an archive under the skip-failed policy.
pub fn record_clip_skipped() {
    counter!(names::CLIPS_SKIPPED_TOTAL).increment(1);
}

pub fn record_upload_staged(container: &str) {
    let labels = [("container", container.to_string())];
    counter!(names::UPLOADS_STAGED_TOTAL, &labels).increment(1);
}
