//! FFmpeg CLI wrapper for clip extraction.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Process supervision with timeout, cancellation and bounded diagnostics
//! - FFprobe duration lookup for range clamping
//! - The [`ClipCutter`] capability and its FFmpeg backend

pub mod command;
pub mod cutter;
pub mod error;
pub mod probe;

#[cfg(all(test, unix))]
mod test_support;

pub use command::{
    cancel_requested, check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner,
    DIAGNOSTIC_EXCERPT_CHARS,
};
pub use cutter::{clamp_range, ClipCutter, CutError, FfmpegClipCutter};
pub use error::{MediaError, MediaResult};
pub use probe::Prober;
