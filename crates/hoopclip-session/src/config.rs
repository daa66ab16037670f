//! Session configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use hoopclip_models::encoding::{
    EncodingConfig, DEFAULT_AUDIO_CODEC, DEFAULT_CRF, DEFAULT_PRESET, DEFAULT_VIDEO_CODEC,
};

/// Default upload ceiling (2 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// What a clip export does when one cut fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole export on the first failed cut.
    #[default]
    FailFast,
    /// Package the clips that succeeded and report the rest.
    SkipFailed,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(FailurePolicy::FailFast),
            "skip_failed" => Ok(FailurePolicy::SkipFailed),
            other => Err(format!("unknown failure policy '{}'", other)),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum concurrent FFmpeg cuts per export
    pub max_parallel_cuts: usize,
    /// Wall-clock limit for a single cut, and for the duration lookup before it
    pub cut_timeout: Duration,
    /// How long an aborted export waits for in-flight cuts to stop
    pub stop_grace: Duration,
    /// Parent directory for staged uploads and clip scratch space
    pub work_dir: PathBuf,
    /// Batch behavior on a failed cut
    pub failure_policy: FailurePolicy,
    /// Largest accepted upload
    pub max_upload_bytes: u64,
    /// FFmpeg executable
    pub ffmpeg_program: PathBuf,
    /// FFprobe executable
    pub ffprobe_program: PathBuf,
    /// Output codecs for cut clips
    pub encoding: EncodingConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_parallel_cuts: 4,
            cut_timeout: Duration::from_secs(600),
            stop_grace: Duration::from_secs(5),
            work_dir: std::env::temp_dir(),
            failure_policy: FailurePolicy::FailFast,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ffmpeg_program: PathBuf::from("ffmpeg"),
            ffprobe_program: PathBuf::from("ffprobe"),
            encoding: EncodingConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_parallel_cuts: env_parse("HOOPCLIP_MAX_PARALLEL_CUTS")
                .unwrap_or(4usize)
                .max(1),
            cut_timeout: Duration::from_secs(env_parse("HOOPCLIP_CUT_TIMEOUT_SECS").unwrap_or(600)),
            stop_grace: Duration::from_secs(env_parse("HOOPCLIP_STOP_GRACE_SECS").unwrap_or(5)),
            work_dir: std::env::var("HOOPCLIP_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            failure_policy: env_parse("HOOPCLIP_FAILURE_POLICY").unwrap_or_default(),
            max_upload_bytes: env_parse("HOOPCLIP_MAX_UPLOAD_BYTES")
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            ffmpeg_program: std::env::var("HOOPCLIP_FFMPEG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ffmpeg")),
            ffprobe_program: std::env::var("HOOPCLIP_FFPROBE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ffprobe")),
            encoding: EncodingConfig {
                codec: std::env::var("HOOPCLIP_VIDEO_CODEC")
                    .unwrap_or_else(|_| DEFAULT_VIDEO_CODEC.to_string()),
                audio_codec: std::env::var("HOOPCLIP_AUDIO_CODEC")
                    .unwrap_or_else(|_| DEFAULT_AUDIO_CODEC.to_string()),
                preset: std::env::var("HOOPCLIP_PRESET")
                    .unwrap_or_else(|_| DEFAULT_PRESET.to_string()),
                crf: env_parse("HOOPCLIP_CRF").unwrap_or(DEFAULT_CRF),
                extra_args: Vec::new(),
            },
        }
    }

    /// Returns a new config with an updated work directory.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Returns a new config with an updated failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.max_parallel_cuts, 4);
        assert_eq!(config.stop_grace, Duration::from_secs(5));
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.encoding.codec, "libx264");
        assert_eq!(config.encoding.audio_codec, "aac");
    }

    #[test]
    fn test_failure_policy_from_str() {
        assert_eq!("fail_fast".parse::<FailurePolicy>(), Ok(FailurePolicy::FailFast));
        assert_eq!("Skip-Failed".parse::<FailurePolicy>(), Ok(FailurePolicy::SkipFailed));
        assert!("retry".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn test_builders() {
        let config = SessionConfig::default()
            .with_work_dir("/srv/hoopclip")
            .with_failure_policy(FailurePolicy::SkipFailed);
        assert_eq!(config.work_dir, PathBuf::from("/srv/hoopclip"));
        assert_eq!(config.failure_policy, FailurePolicy::SkipFailed);
    }
}
