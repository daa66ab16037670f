//! Per-event clip outcomes and output naming.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Container extension used for every cut clip.
pub const CLIP_EXTENSION: &str = "mp4";

/// Maximum length of the label part of a clip filename.
const MAX_LABEL_CHARS: usize = 50;

/// Outcome of cutting one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ClipStatus {
    Success,
    Failure(String),
}

impl ClipStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ClipStatus::Success)
    }
}

/// Result of one cut inside a batch export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipResult {
    /// 1-based position of the event in the store
    pub event_index: usize,
    /// Where the clip was (or would have been) written
    pub output_path: PathBuf,
    pub status: ClipStatus,
}

impl ClipResult {
    pub fn success(event_index: usize, output_path: impl Into<PathBuf>) -> Self {
        Self {
            event_index,
            output_path: output_path.into(),
            status: ClipStatus::Success,
        }
    }

    pub fn failure(
        event_index: usize,
        output_path: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            event_index,
            output_path: output_path.into(),
            status: ClipStatus::Failure(reason.into()),
        }
    }
}

/// Generate the output filename for an event.
///
/// Format: `clip_{index:03}_{label}.mp4`, so lexicographic order matches
/// timeline order for up to 999 events.
pub fn clip_filename(event_index: usize, label: &str) -> String {
    format!(
        "clip_{:03}_{}.{}",
        event_index,
        sanitize_label(label),
        CLIP_EXTENSION
    )
}

/// Sanitize a label for use in filenames.
///
/// ASCII alphanumerics, `-` and `_` are kept; every other character becomes
/// `_` (so `Foul/TO` cannot escape the clip directory).
pub fn sanitize_label(label: &str) -> String {
    let sanitized: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_LABEL_CHARS)
        .collect();

    if sanitized.is_empty() {
        "event".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_filename() {
        assert_eq!(clip_filename(3, "Shot"), "clip_003_Shot.mp4");
        assert_eq!(clip_filename(12, "Possession"), "clip_012_Possession.mp4");
    }

    #[test]
    fn test_clip_filename_escapes_slash() {
        assert_eq!(clip_filename(2, "Foul/TO"), "clip_002_Foul_TO.mp4");
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("fast break"), "fast_break");
        assert_eq!(sanitize_label("../../etc"), "______etc");
        assert_eq!(sanitize_label("   "), "event");
        assert_eq!(sanitize_label(&"x".repeat(80)).len(), 50);
    }

    #[test]
    fn test_filenames_sort_in_timeline_order() {
        let mut names: Vec<String> = (1..=12).map(|i| clip_filename(i, "Shot")).collect();
        let expected = names.clone();
        names.sort();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_clip_result_constructors() {
        let ok = ClipResult::success(1, "/tmp/clip_001_Shot.mp4");
        assert!(ok.status.is_success());

        let failed = ClipResult::failure(2, "/tmp/clip_002_Other.mp4", "ffmpeg exited 1");
        assert_eq!(failed.status, ClipStatus::Failure("ffmpeg exited 1".to_string()));
    }
}
