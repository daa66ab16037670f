//! FFprobe duration lookup.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::warn;

use crate::command::{cancel_requested, deadline, excerpt, DIAGNOSTIC_EXCERPT_CHARS};
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Container-level duration lookups through `ffprobe`.
#[derive(Debug, Clone)]
pub struct Prober {
    program: PathBuf,
    cancel_rx: Option<watch::Receiver<bool>>,
    timeout_secs: Option<u64>,
}

impl Default for Prober {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober {
    /// Create a prober using `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffprobe"),
            cancel_rx: None,
            timeout_secs: None,
        }
    }

    /// Use a specific FFprobe executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Get the container duration of a media file in seconds.
    ///
    /// FFprobe is killed when the timeout fires or the cancel signal flips.
    pub async fn duration(&self, path: impl AsRef<Path>) -> MediaResult<f64> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let program = which::which(&self.program)
            .map_err(|_| MediaError::FfprobeNotFound(self.program.display().to_string()))?;

        let mut command = Command::new(program);
        command
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::select! {
            output = command.output() => output?,
            _ = cancel_requested(self.cancel_rx.clone()) => return Err(MediaError::Cancelled),
            _ = deadline(self.timeout_secs) => {
                let secs = self.timeout_secs.unwrap_or_default();
                warn!(path = %path.display(), "FFprobe timed out after {} seconds, killing process", secs);
                return Err(MediaError::Timeout(secs));
            }
        };

        if !output.status.success() {
            return Err(MediaError::FfprobeFailed {
                message: "FFprobe failed".to_string(),
                stderr: Some(excerpt(
                    &String::from_utf8_lossy(&output.stderr),
                    DIAGNOSTIC_EXCERPT_CHARS,
                )),
            });
        }

        parse_duration(&output.stdout)
    }
}

/// Extract `format.duration` from FFprobe JSON output.
fn parse_duration(stdout: &[u8]) -> MediaResult<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| MediaError::InvalidVideo("container reports no duration".to_string()))
}
