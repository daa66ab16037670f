//! Session error types.

use hoopclip_media::CutError;
use hoopclip_models::TimestampError;
use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationError>;
pub type StagingResult<T> = Result<T, StagingError>;
pub type ExportResult<T> = Result<T, ExportError>;

/// Rejected event entry. The event store is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid time format: {0}")]
    BadFormat(#[from] TimestampError),

    #[error("End time must be greater than start time ({start_s}s to {end_s}s)")]
    NonPositiveDuration { start_s: f64, end_s: f64 },

    #[error("Start time cannot be negative ({0}s)")]
    NegativeStart(f64),

    #[error("No event at position {0}")]
    NoSuchEvent(usize),
}

/// Upload could not be staged.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to stage upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported video type '{0}'. Use MP4, MOV, M4V or AVI")]
    UnsupportedContainer(String),

    #[error("Upload is empty")]
    Empty,

    #[error("Upload of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: u64, max: u64 },
}

/// Export could not produce its artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No events to export")]
    NoEvents,

    #[error("No video has been uploaded")]
    NoSource,

    #[error("Clip {event_index} ({label}) failed: {source}")]
    Cut {
        event_index: usize,
        label: String,
        #[source]
        source: CutError,
    },

    #[error("All {failed} clips failed")]
    AllClipsFailed { failed: usize },

    #[error("Export cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl ExportError {
    /// 1-based event index of a failed cut, if this is one.
    pub fn event_index(&self) -> Option<usize> {
        match self {
            ExportError::Cut { event_index, .. } => Some(*event_index),
            _ => None,
        }
    }
}
