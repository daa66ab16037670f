//! Artifact export: the CSV event table and the zipped highlight clips.
//!
//! Clip export cuts every event concurrently (bounded by
//! `max_parallel`), then packs the clips into a zip in event order. Clip
//! files live in a per-export scratch directory that is removed on every
//! exit path, including failure and cancellation. An aborted export raises
//! the shared stop flag and waits up to a grace period for in-flight cuts
//! to wind down before the scratch directory goes.

pub mod archive;
pub mod csv;

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::watch;
use tracing::{debug, warn, Instrument};

use hoopclip_media::{cancel_requested, ClipCutter, CutError};
use hoopclip_models::{clip_filename, ClipResult, Event};

use crate::config::{FailurePolicy, SessionConfig};
use crate::error::{ExportError, ExportResult};
use crate::logging::ExportLogger;
use crate::metrics;

pub use self::csv::events_to_csv;

pub const CSV_FILE_NAME: &str = "events.csv";
pub const CSV_MIME_TYPE: &str = "text/csv";
pub const ARCHIVE_FILE_NAME: &str = "highlights.zip";
pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Prefix of the per-export clip scratch directory.
pub const CLIP_DIR_PREFIX: &str = "hoopclip-clips-";

/// A downloadable export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Zip archive plus the per-event outcomes that produced it.
#[derive(Debug, Clone)]
pub struct ClipBundle {
    pub archive: ExportArtifact,
    /// One entry per event, ordered by event index
    pub results: Vec<ClipResult>,
}

impl ClipBundle {
    /// Results of cuts that were left out of the archive.
    pub fn failures(&self) -> impl Iterator<Item = &ClipResult> {
        self.results.iter().filter(|r| !r.status.is_success())
    }
}

/// Serialize events as the `events.csv` download.
pub fn export_csv(events: &[Event]) -> ExportResult<ExportArtifact> {
    let logger = ExportLogger::new("csv");
    let started = Instant::now();

    let bytes = events_to_csv(events)?;
    logger.log_completion(&format!("{} rows, {} bytes", events.len(), bytes.len()));
    metrics::record_export("csv", "success", started.elapsed().as_secs_f64());

    Ok(ExportArtifact {
        file_name: CSV_FILE_NAME,
        mime_type: CSV_MIME_TYPE,
        bytes,
    })
}

/// Cuts and packages one clip per event.
#[derive(Clone)]
pub struct BatchExporter {
    cutter: Arc<dyn ClipCutter>,
    max_parallel: usize,
    policy: FailurePolicy,
    work_dir: PathBuf,
    stop: Option<Arc<watch::Sender<bool>>>,
    stop_grace: Duration,
}

impl std::fmt::Debug for BatchExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchExporter")
            .field("cutter", &self.cutter.name())
            .field("max_parallel", &self.max_parallel)
            .field("policy", &self.policy)
            .field("work_dir", &self.work_dir)
            .field("stop_grace", &self.stop_grace)
            .finish()
    }
}

impl BatchExporter {
    pub fn new(cutter: Arc<dyn ClipCutter>) -> Self {
        Self {
            cutter,
            max_parallel: 1,
            policy: FailurePolicy::default(),
            work_dir: std::env::temp_dir(),
            stop: None,
            stop_grace: Duration::from_secs(5),
        }
    }

    /// Exporter using the concurrency, policy and scratch location of `config`.
    pub fn from_config(cutter: Arc<dyn ClipCutter>, config: &SessionConfig) -> Self {
        Self::new(cutter)
            .with_max_parallel(config.max_parallel_cuts)
            .with_policy(config.failure_policy)
            .with_work_dir(&config.work_dir)
            .with_stop_grace(config.stop_grace)
    }

    /// Maximum concurrent cuts (at least 1).
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Stop flag shared with the cutter.
    ///
    /// The export aborts once it reads `true`, and raises it itself when a
    /// fail-fast cut fails so cutters watching it stop their work.
    pub fn with_stop_signal(mut self, stop: Arc<watch::Sender<bool>>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Wait for in-flight cuts after an abort.
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Cut every event from `source` and zip the clips.
    ///
    /// Archive entries are named `clip_{index:03}_{label}.mp4` and are packed
    /// by ascending event index however the cuts were scheduled. This matches
    /// sorted filename order until an export exceeds 999 events, where the
    /// index outgrows its padding (`clip_1000_*` still follows `clip_999_*`).
    ///
    /// Under [`FailurePolicy::FailFast`] the first failed cut aborts the
    /// export: queued cuts never start and in-flight cuts get the stop grace
    /// period to exit before the scratch directory is removed.
    pub async fn export_clips(&self, source: &Path, events: &[Event]) -> ExportResult<ClipBundle> {
        let logger = ExportLogger::new("clips");
        if events.is_empty() {
            logger.log_warning("No events to export");
            return Err(ExportError::NoEvents);
        }

        let span = logger.create_span();
        let started = Instant::now();
        let result = self
            .cut_and_pack(source, events, &logger)
            .instrument(span)
            .await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(ExportError::Cancelled) => "cancelled",
            Err(_) => "failure",
        };
        metrics::record_export("clips", outcome, started.elapsed().as_secs_f64());
        result
    }

    async fn cut_and_pack(
        &self,
        source: &Path,
        events: &[Event],
        logger: &ExportLogger,
    ) -> ExportResult<ClipBundle> {
        let total = events.len();
        logger.log_start(&format!(
            "{} events from {} ({} parallel, {:?}, cutter {})",
            total,
            source.display(),
            self.max_parallel,
            self.policy,
            self.cutter.name()
        ));

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix(CLIP_DIR_PREFIX)
            .tempdir_in(&self.work_dir)?;
        let clip_dir = scratch.path().to_path_buf();

        let cutter = &self.cutter;
        let mut cuts = stream::iter(events.iter().enumerate())
            .map(|(i, event)| {
                let index = i + 1;
                let dest = clip_dir.join(clip_filename(index, &event.label));
                // Evaluated as a slot frees up, so cuts queued behind an abort never start.
                let stopped = self.stop_requested();
                async move {
                    let outcome = if stopped {
                        Err(CutError::Cancelled)
                    } else {
                        cutter.cut(source, &dest, event.start_s, event.end_s).await
                    };
                    (index, event, dest, outcome)
                }
            })
            .buffer_unordered(self.max_parallel);

        let cancel_rx = self.stop.as_ref().map(|stop| stop.subscribe());
        let mut results = Vec::with_capacity(total);
        let aborted = loop {
            let next = tokio::select! {
                biased;
                _ = cancel_requested(cancel_rx.clone()) => {
                    logger.log_warning("Cancelled, stopping in-flight cuts");
                    break Some(ExportError::Cancelled);
                }
                next = cuts.next() => next,
            };
            let Some((index, event, dest, outcome)) = next else {
                break None;
            };

            match outcome {
                Ok(()) => {
                    logger.log_progress(&format!(
                        "clip {}/{} ready ({})",
                        index, total, event.label
                    ));
                    results.push(ClipResult::success(index, dest));
                }
                Err(CutError::Cancelled) => {
                    logger.log_warning(&format!("clip {} cancelled", index));
                    break Some(ExportError::Cancelled);
                }
                Err(e) => match self.policy {
                    FailurePolicy::FailFast => {
                        logger.log_error(&format!("clip {} ({}) failed: {}", index, event.label, e));
                        break Some(ExportError::Cut {
                            event_index: index,
                            label: event.label.clone(),
                            source: e,
                        });
                    }
                    FailurePolicy::SkipFailed => {
                        logger.log_warning(&format!(
                            "clip {} ({}) skipped: {}",
                            index, event.label, e
                        ));
                        discard_partial(&dest).await;
                        metrics::record_clip_skipped();
                        results.push(ClipResult::failure(index, dest, e.to_string()));
                    }
                },
            }
        };

        if let Some(err) = aborted {
            if let Some(stop) = &self.stop {
                stop.send_replace(true);
            }
            let drain = async { while cuts.next().await.is_some() {} };
            if tokio::time::timeout(self.stop_grace, drain).await.is_err() {
                logger.log_warning("In-flight cuts outlived the stop grace period, abandoning them");
            }
            drop(cuts);
            remove_scratch(scratch).await;
            return Err(err);
        }
        drop(cuts);

        results.sort_by_key(|r| r.event_index);
        let clips: Vec<PathBuf> = results
            .iter()
            .filter(|r| r.status.is_success())
            .map(|r| r.output_path.clone())
            .collect();

        if clips.is_empty() {
            logger.log_error("every clip failed");
            remove_scratch(scratch).await;
            return Err(ExportError::AllClipsFailed { failed: total });
        }

        let packed = archive::pack(clips.clone()).await;
        remove_scratch(scratch).await;
        let bytes = packed?;
        logger.log_completion(&format!(
            "{} of {} clips packed into {} ({} bytes)",
            clips.len(),
            total,
            ARCHIVE_FILE_NAME,
            bytes.len()
        ));

        Ok(ClipBundle {
            archive: ExportArtifact {
                file_name: ARCHIVE_FILE_NAME,
                mime_type: ARCHIVE_MIME_TYPE,
                bytes,
            },
            results,
        })
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().is_some_and(|stop| *stop.borrow())
    }
}

/// Remove the clip scratch directory off the async runtime, logging failures.
async fn remove_scratch(scratch: TempDir) {
    let dir = scratch.path().to_path_buf();
    match tokio::task::spawn_blocking(move || scratch.close()).await {
        Ok(Ok(())) => debug!(dir = %dir.display(), "Removed clip scratch directory"),
        Ok(Err(e)) => {
            warn!(dir = %dir.display(), error = %e, "Failed to remove clip scratch directory")
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Clip scratch cleanup task failed")
        }
    }
}

async fn discard_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(output = %path.display(), error = %e, "Failed to remove failed clip output");
        }
    }
}
