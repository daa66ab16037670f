//! One annotation session: an uploaded video, its events, and exports.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use hoopclip_media::{ClipCutter, FfmpegClipCutter, FfmpegRunner, Prober};
use hoopclip_models::Event;

use crate::config::SessionConfig;
use crate::error::{ExportError, ExportResult, StagingResult, ValidationResult};
use crate::event_store::EventStore;
use crate::export::{self, BatchExporter, ClipBundle, ExportArtifact};
use crate::staging::{UploadStaging, VideoContainer};

/// Stops a running clip export from another task.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Interactive state for annotating one game video.
///
/// Events and the staged upload live only as long as the session. Dropping
/// it removes every staged file.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    events: EventStore,
    staging: UploadStaging,
    source: Option<PathBuf>,
    exporter: BatchExporter,
    cancel_tx: Arc<watch::Sender<bool>>,
}

impl Session {
    /// Session cutting clips with FFmpeg.
    ///
    /// FFmpeg and FFprobe processes are killed when the export is cancelled
    /// or a fail-fast cut fails.
    pub fn new(config: SessionConfig) -> StagingResult<Self> {
        let cancel_tx = Arc::new(watch::Sender::new(false));
        let timeout_secs = config.cut_timeout.as_secs();

        let runner = FfmpegRunner::new()
            .with_program(&config.ffmpeg_program)
            .with_timeout(timeout_secs)
            .with_cancel(cancel_tx.subscribe());
        let prober = Prober::new()
            .with_program(&config.ffprobe_program)
            .with_timeout(timeout_secs)
            .with_cancel(cancel_tx.subscribe());
        let cutter = FfmpegClipCutter::new(config.encoding.clone())
            .with_runner(runner)
            .with_prober(prober);

        Self::assemble(config, Arc::new(cutter), cancel_tx)
    }

    /// Session with a caller-supplied cutting backend.
    pub fn with_cutter(config: SessionConfig, cutter: Arc<dyn ClipCutter>) -> StagingResult<Self> {
        Self::assemble(config, cutter, Arc::new(watch::Sender::new(false)))
    }

    fn assemble(
        config: SessionConfig,
        cutter: Arc<dyn ClipCutter>,
        cancel_tx: Arc<watch::Sender<bool>>,
    ) -> StagingResult<Self> {
        let staging = UploadStaging::new(&config.work_dir, config.max_upload_bytes)?;
        let exporter =
            BatchExporter::from_config(cutter, &config).with_stop_signal(Arc::clone(&cancel_tx));

        info!(
            work_dir = %config.work_dir.display(),
            max_parallel_cuts = config.max_parallel_cuts,
            failure_policy = ?config.failure_policy,
            "Session created"
        );

        Ok(Self {
            config,
            events: EventStore::new(),
            staging,
            source: None,
            exporter,
            cancel_tx,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Stage uploaded bytes and make them the clip source.
    ///
    /// `content_type` may be a MIME type or a file extension. A later
    /// upload replaces the source; events are kept.
    pub async fn upload(&mut self, bytes: &[u8], content_type: &str) -> StagingResult<&Path> {
        let container = VideoContainer::detect(content_type)?;
        let path = self.staging.stage(bytes, container).await?;
        Ok(self.source.insert(path).as_path())
    }

    /// Use a video already on disk as the clip source, without copying it.
    pub fn set_source(&mut self, path: impl Into<PathBuf>) {
        self.source = Some(path.into());
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn add_event(
        &mut self,
        label: impl Into<String>,
        start_text: &str,
        end_text: &str,
    ) -> ValidationResult<()> {
        self.events.add(label, start_text, end_text)
    }

    /// Remove the event at a 1-based position.
    pub fn remove_event(&mut self, position: usize) -> ValidationResult<Event> {
        self.events.remove(position)
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> &EventStore {
        &self.events
    }

    /// The event list as `events.csv`.
    pub fn export_csv(&self) -> ExportResult<ExportArtifact> {
        export::export_csv(self.events.list())
    }

    /// Cut every event from the uploaded video into `highlights.zip`.
    pub async fn export_clips(&self) -> ExportResult<ClipBundle> {
        if self.events.is_empty() {
            return Err(ExportError::NoEvents);
        }
        let source = self.source.as_deref().ok_or(ExportError::NoSource)?;

        // A cancel or fail-fast stop from an earlier export must not stop this one.
        self.cancel_tx.send_replace(false);
        self.exporter.export_clips(source, self.events.list()).await
    }

    /// Handle that cancels the clip export in progress.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel_tx),
        }
    }
}
