//! Annotation sessions for basketball game video.
//!
//! A [`Session`] holds one uploaded video and an ordered list of labeled
//! time intervals. It exports the list as `events.csv` and cuts each
//! interval into a clip, packaged as `highlights.zip`.

pub mod config;
pub mod error;
pub mod event_store;
pub mod export;
pub mod logging;
pub mod manifest;
pub mod metrics;
pub mod session;
pub mod staging;

pub use config::{FailurePolicy, SessionConfig};
pub use error::{
    ExportError, ExportResult, StagingError, StagingResult, ValidationError, ValidationResult,
};
pub use event_store::EventStore;
pub use export::{BatchExporter, ClipBundle, ExportArtifact};
pub use logging::ExportLogger;
pub use manifest::{parse_manifest, ManifestEntry, TimeText};
pub use session::{CancelHandle, Session};
pub use staging::{UploadStaging, VideoContainer};
