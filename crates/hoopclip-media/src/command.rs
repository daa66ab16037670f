//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Upper bound on diagnostic text kept from a single tool invocation.
pub const DIAGNOSTIC_EXCERPT_CHARS: usize = 500;

/// Builder for FFmpeg commands.
///
/// Always overwrites the output and logs errors only.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after -i)
    output_args: Vec<String>,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
        }
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Frame-accurate seek after the input.
    pub fn accurate_seek(self, seconds: f64) -> Self {
        self.output_arg("-ss").output_arg(format_secs(seconds))
    }

    /// Absolute end position in the input timeline.
    pub fn end_at(self, seconds: f64) -> Self {
        self.output_arg("-to").output_arg(format_secs(seconds))
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-v".to_string(), "error".to_string()];

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Seconds with millisecond precision, as FFmpeg expects them.
fn format_secs(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

/// Runner for FFmpeg commands with timeout, cancellation and bounded
/// diagnostics capture.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    /// Executable name or path
    program: PathBuf,
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a new runner using `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            cancel_rx: None,
            timeout_secs: None,
        }
    }

    /// Use a specific FFmpeg executable.
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

    /// Run an FFmpeg command.
    ///
    /// The child process is killed if the timeout fires, the cancel signal
    /// flips to `true`, or the returned future is dropped.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let program = which::which(&self.program)
            .map_err(|_| MediaError::FfmpegNotFound(self.program.display().to_string()))?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", program.display(), args.join(" "));

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("stderr not captured", None, None))?;
        let diagnostics_handle = tokio::spawn(collect_diagnostics(stderr, DIAGNOSTIC_EXCERPT_CHARS));

        let outcome = tokio::select! {
            status = child.wait() => Outcome::Exited(status?),
            _ = cancel_requested(self.cancel_rx.clone()) => Outcome::Cancelled,
            _ = deadline(self.timeout_secs) => Outcome::TimedOut,
        };

        match outcome {
            Outcome::Exited(status) => {
                let diagnostics = diagnostics_handle.await.unwrap_or_default();
                check_status(status, diagnostics)
            }
            Outcome::Cancelled => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
            Outcome::TimedOut => {
                let secs = self.timeout_secs.unwrap_or_default();
                warn!("FFmpeg timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(secs))
            }
        }
    }
}

enum Outcome {
    Exited(ExitStatus),
    Cancelled,
    TimedOut,
}

fn check_status(status: ExitStatus, diagnostics: String) -> MediaResult<()> {
    if status.success() {
        return Ok(());
    }

    let stderr = if diagnostics.is_empty() {
        None
    } else {
        Some(diagnostics)
    };
    Err(MediaError::ffmpeg_failed(
        "FFmpeg exited with non-zero status",
        stderr,
        status.code(),
    ))
}

/// Resolve once the cancel flag reads `true`; never resolves without a receiver
/// or once the sender is gone.
pub async fn cancel_requested(cancel_rx: Option<watch::Receiver<bool>>) {
    if let Some(mut rx) = cancel_rx {
        if rx.wait_for(|cancel| *cancel).await.is_ok() {
            return;
        }
    }
    std::future::pending::<()>().await
}

/// Resolve after `timeout_secs`; never resolves without a timeout.
pub(crate) async fn deadline(timeout_secs: Option<u64>) {
    match timeout_secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => std::future::pending::<()>().await,
    }
}

/// Drain stderr to EOF, keeping at most `max_chars` characters.
async fn collect_diagnostics(stderr: ChildStderr, max_chars: usize) -> String {
    let mut reader = BufReader::new(stderr).lines();
    let mut kept = String::new();
    let mut kept_chars = 0usize;

    while let Ok(Some(line)) = reader.next_line().await {
        if kept_chars >= max_chars {
            continue;
        }
        if !kept.is_empty() {
            kept.push('\n');
            kept_chars += 1;
        }
        let take = max_chars.saturating_sub(kept_chars);
        kept.extend(line.chars().take(take));
        kept_chars += line.chars().count().min(take);
    }

    kept
}

/// Truncate text to at most `max_chars` characters.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg(program: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let program = program.as_ref();
    which::which(program).map_err(|_| MediaError::FfmpegNotFound(program.display().to_string()))
}

/// Check if FFprobe is available.
pub fn check_ffprobe(program: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let program = program.as_ref();
    which::which(program).map_err(|_| MediaError::FfprobeNotFound(program.display().to_string()))
}
