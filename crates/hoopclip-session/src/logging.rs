//! Structured export logging.
//!
//! Every log line of one export carries the same export ID and artifact
//! kind, so concurrent cuts can be correlated.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Logger for one export run.
#[derive(Debug, Clone)]
pub struct ExportLogger {
    export_id: String,
    artifact: String,
}

impl ExportLogger {
    /// Create a logger with a fresh export ID.
    ///
    /// # Arguments
    /// * `artifact` - What is being exported (e.g., "csv", "clips")
    pub fn new(artifact: &str) -> Self {
        Self {
            export_id: Uuid::new_v4().to_string(),
            artifact: artifact.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            export_id = %self.export_id,
            artifact = %self.artifact,
            "Export started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            export_id = %self.export_id,
            artifact = %self.artifact,
            "Export progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            export_id = %self.export_id,
            artifact = %self.artifact,
            "Export warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            export_id = %self.export_id,
            artifact = %self.artifact,
            "Export error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            export_id = %self.export_id,
            artifact = %self.artifact,
            "Export completed: {}", message
        );
    }

    /// Span grouping everything logged during this export.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "export",
            export_id = %self.export_id,
            artifact = %self.artifact
        )
    }
}
