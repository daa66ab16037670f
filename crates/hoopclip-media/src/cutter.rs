//! Single-event clip extraction.
//!
//! [`ClipCutter`] is the narrow capability the exporter depends on: cut one
//! `[start, end)` interval of a source file into one output file. The
//! production backend is [`FfmpegClipCutter`]; tests substitute fakes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use hoopclip_models::EncodingConfig;

use crate::command::{excerpt, FfmpegCommand, FfmpegRunner, DIAGNOSTIC_EXCERPT_CHARS};
use crate::error::MediaError;
use crate::probe::Prober;

/// Why a single cut failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CutError {
    #[error("Invalid clip range: start {start_s:.3}s is not before end {end_s:.3}s")]
    InvalidRange { start_s: f64, end_s: f64 },

    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("Cut cancelled")]
    Cancelled,
}

impl CutError {
    /// Build a transcode failure, bounding the diagnostic text.
    pub fn transcode_failed(detail: impl AsRef<str>) -> Self {
        Self::TranscodeFailed(excerpt(detail.as_ref(), DIAGNOSTIC_EXCERPT_CHARS))
    }
}

impl From<MediaError> for CutError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Cancelled => CutError::Cancelled,
            MediaError::Timeout(secs) => {
                CutError::transcode_failed(format!("timed out after {} seconds", secs))
            }
            MediaError::FfmpegFailed {
                message,
                stderr,
                exit_code,
            } => {
                let code = exit_code
                    .map(|c| format!("exit code {}", c))
                    .unwrap_or_else(|| "terminated by signal".to_string());
                match stderr {
                    Some(stderr) => CutError::transcode_failed(format!("{} ({}): {}", message, code, stderr)),
                    None => CutError::transcode_failed(format!("{} ({})", message, code)),
                }
            }
            other => CutError::transcode_failed(other.to_string()),
        }
    }
}

/// Capability to cut one interval of a source video into a file.
#[async_trait]
pub trait ClipCutter: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Cut `[start_s, end_s]` of `source` into `dest`.
    async fn cut(&self, source: &Path, dest: &Path, start_s: f64, end_s: f64) -> Result<(), CutError>;
}

/// Validate a cut interval and clamp it into `[0, source_duration]`.
///
/// Without a known duration the bounds pass through unchanged and any
/// out-of-range failure is left to the transcoder.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub fn clamp_range(
    start_s: f64,
    end_s: f64,
    source_duration: Option<f64>,
) -> Result<(f64, f64), CutError> {
    // Written as a negation so NaN bounds are rejected too.
    if !(end_s > start_s) {
        return Err(CutError::InvalidRange { start_s, end_s });
    }

    let (start, end) = match source_duration {
        Some(duration) if duration.is_finite() && duration > 0.0 => {
            (start_s.clamp(0.0, duration), end_s.clamp(0.0, duration))
        }
        _ => (start_s, end_s),
    };

    if !(end > start) {
        return Err(CutError::InvalidRange {
            start_s: start,
            end_s: end,
        });
    }

    Ok((start, end))
}

/// [`ClipCutter`] backed by the `ffmpeg` CLI.
///
/// Cuts are frame accurate (`-ss`/`-to` after `-i`) and re-encoded with the
/// configured codecs (H.264/AAC by default).
#[derive(Debug)]
pub struct FfmpegClipCutter {
    runner: FfmpegRunner,
    prober: Option<Prober>,
    encoding: EncodingConfig,
    /// Source durations already probed, `None` when undiscoverable
    durations: Mutex<HashMap<PathBuf, Option<f64>>>,
}

impl FfmpegClipCutter {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            runner: FfmpegRunner::new(),
            prober: Some(Prober::new()),
            encoding,
            durations: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the FFmpeg runner (timeout, cancellation, executable).
    pub fn with_runner(mut self, runner: FfmpegRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Replace the FFprobe prober (timeout, cancellation, executable).
    pub fn with_prober(mut self, prober: Prober) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Skip duration probing; bounds are never clamped.
    pub fn without_probe(mut self) -> Self {
        self.prober = None;
        self
    }

    /// Build the FFmpeg invocation for an already clamped interval.
    pub fn build_command(&self, source: &Path, dest: &Path, start_s: f64, end_s: f64) -> FfmpegCommand {
        FfmpegCommand::new(source, dest)
            .accurate_seek(start_s)
            .end_at(end_s)
            .output_args(self.encoding.to_ffmpeg_args())
    }

    /// Source duration, probed once per path.
    ///
    /// A failed or timed out lookup yields `None`; only cancellation is an error.
    async fn source_duration(&self, source: &Path) -> Result<Option<f64>, CutError> {
        let Some(prober) = self.prober.as_ref() else {
            return Ok(None);
        };

        if let Some(cached) = self.cached_duration(source) {
            return Ok(cached);
        }

        let duration = match prober.duration(source).await {
            Ok(duration) => Some(duration),
            Err(MediaError::Cancelled) => return Err(CutError::Cancelled),
            Err(e) => {
                debug!(source = %source.display(), error = %e, "Source duration unavailable, cutting unclamped");
                None
            }
        };

        if let Ok(mut durations) = self.durations.lock() {
            durations.insert(source.to_path_buf(), duration);
        }
        Ok(duration)
    }

    fn cached_duration(&self, source: &Path) -> Option<Option<f64>> {
        self.durations
            .lock()
            .ok()
            .and_then(|durations| durations.get(source).copied())
    }
}

#[async_trait]
impl ClipCutter for FfmpegClipCutter {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn cut(&self, source: &Path, dest: &Path, start_s: f64, end_s: f64) -> Result<(), CutError> {
        // Reject bad ranges before paying for a probe.
        clamp_range(start_s, end_s, None)?;

        let duration = self.source_duration(source).await?;
        let (start, end) = clamp_range(start_s, end_s, duration)?;

        if start != start_s || end != end_s {
            debug!(
                requested_start = start_s,
                requested_end = end_s,
                start_s = start,
                end_s = end,
                "Clamped cut to source duration"
            );
        }

        info!(
            "Cutting clip: {} -> {} ({:.3}s - {:.3}s)",
            source.display(),
            dest.display(),
            start,
            end
        );

        let started = Instant::now();
        let cmd = self.build_command(source, dest, start, end);

        match self.runner.run(&cmd).await {
            Ok(()) => {
                metrics::counter!("hoopclip_clips_cut_total").increment(1);
                metrics::histogram!("hoopclip_cut_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                Ok(())
            }
            Err(e) => {
                metrics::counter!("hoopclip_clip_failures_total").increment(1);
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!(output = %dest.display(), error = %rm, "Failed to remove partial clip");
                    }
                }
                Err(CutError::from(e))
            }
        }
    }
}
