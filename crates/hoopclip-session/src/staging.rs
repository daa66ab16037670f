//! Upload staging.
//!
//! An uploaded video is written once into a session-owned scratch
//! directory so FFmpeg can read it by path. Identical bytes map to the
//! same staged file whatever container type they were declared as, so
//! re-submitting an upload never duplicates it.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{StagingError, StagingResult};
use crate::metrics;

/// Video containers accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoContainer {
    Mp4,
    Mov,
    M4v,
    Avi,
}

impl VideoContainer {
    pub const ALL: [VideoContainer; 4] = [
        VideoContainer::Mp4,
        VideoContainer::Mov,
        VideoContainer::M4v,
        VideoContainer::Avi,
    ];

    /// Map a MIME content type, ignoring any parameters.
    pub fn from_mime(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "video/mp4" => Some(VideoContainer::Mp4),
            "video/quicktime" => Some(VideoContainer::Mov),
            "video/x-m4v" => Some(VideoContainer::M4v),
            "video/x-msvideo" | "video/avi" | "video/msvideo" => Some(VideoContainer::Avi),
            _ => None,
        }
    }

    /// Map a file extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "mp4" => Some(VideoContainer::Mp4),
            "mov" => Some(VideoContainer::Mov),
            "m4v" => Some(VideoContainer::M4v),
            "avi" => Some(VideoContainer::Avi),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Resolve a content type first as MIME, then as an extension.
    pub fn detect(content_type: &str) -> StagingResult<Self> {
        Self::from_mime(content_type)
            .or_else(|| Self::from_extension(content_type))
            .ok_or_else(|| StagingError::UnsupportedContainer(content_type.to_string()))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "mp4",
            VideoContainer::Mov => "mov",
            VideoContainer::M4v => "m4v",
            VideoContainer::Avi => "avi",
        }
    }

}

/// Session-owned scratch directory holding staged uploads.
///
/// The directory and everything in it is removed when the staging area is
/// dropped.
#[derive(Debug)]
pub struct UploadStaging {
    dir: TempDir,
    /// Content digest -> staged path
    staged: HashMap<String, PathBuf>,
    max_bytes: u64,
}

impl UploadStaging {
    /// Create a staging directory under `work_dir`.
    pub fn new(work_dir: &Path, max_bytes: u64) -> StagingResult<Self> {
        std::fs::create_dir_all(work_dir)?;
        let dir = tempfile::Builder::new()
            .prefix("hoopclip-session-")
            .tempdir_in(work_dir)?;
        debug!(dir = %dir.path().display(), "Created upload staging directory");
        Ok(Self {
            dir,
            staged: HashMap::new(),
            max_bytes,
        })
    }

    /// Directory holding staged uploads.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Number of distinct uploads staged.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Persist upload bytes and return a path FFmpeg can read.
    ///
    /// Bytes already staged return the existing path without writing, even
    /// when declared as a different container.
    pub async fn stage(&mut self, bytes: &[u8], container: VideoContainer) -> StagingResult<PathBuf> {
        if bytes.is_empty() {
            return Err(StagingError::Empty);
        }
        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(StagingError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }

        let digest = format!("{:x}", Sha256::digest(bytes));

        if let Some(existing) = self.staged.get(&digest) {
            if tokio::fs::try_exists(existing).await.unwrap_or(false) {
                debug!(path = %existing.display(), "Upload already staged");
                return Ok(existing.clone());
            }
        }

        let file_name = format!("upload_{}.{}", &digest[..16], container.extension());
        let path = self.dir.path().join(&file_name);
        let partial = self.dir.path().join(format!("{}.part", file_name));

        tokio::fs::write(&partial, bytes).await?;
        tokio::fs::rename(&partial, &path).await?;

        info!(
            path = %path.display(),
            bytes = size,
            container = container.extension(),
            "Staged upload"
        );
        metrics::record_upload_staged(container.extension());
        self.staged.insert(digest, path.clone());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_from_mime() {
        assert_eq!(VideoContainer::from_mime("video/mp4"), Some(VideoContainer::Mp4));
        assert_eq!(
            VideoContainer::from_mime("video/quicktime; codecs=avc1"),
            Some(VideoContainer::Mov)
        );
        assert_eq!(VideoContainer::from_mime("video/x-m4v"), Some(VideoContainer::M4v));
        assert_eq!(VideoContainer::from_mime("video/x-msvideo"), Some(VideoContainer::Avi));
        assert_eq!(VideoContainer::from_mime("video/webm"), None);
    }

    #[test]
    fn test_container_from_extension_and_path() {
        assert_eq!(VideoContainer::from_extension(".MOV"), Some(VideoContainer::Mov));
        assert_eq!(
            VideoContainer::from_path(Path::new("/tmp/game.m4v")),
            Some(VideoContainer::M4v)
        );
        assert_eq!(VideoContainer::from_path(Path::new("game.mkv")), None);
        assert_eq!(VideoContainer::from_path(Path::new("game")), None);
    }

    #[test]
    fn test_detect_rejects_unknown() {
        assert_eq!(VideoContainer::detect("avi").unwrap(), VideoContainer::Avi);
        assert!(matches!(
            VideoContainer::detect("video/webm"),
            Err(StagingError::UnsupportedContainer(t)) if t == "video/webm"
        ));
    }

    #[test]
    fn test_extension_round_trips_for_all() {
        for container in VideoContainer::ALL {
            assert_eq!(VideoContainer::from_extension(container.extension()), Some(container));
            assert_eq!(VideoContainer::detect(container.extension()).unwrap(), container);
        }
    }

    #[tokio::test]
    async fn test_stage_writes_file() {
        let work = tempfile::tempdir().unwrap();
        let mut staging = UploadStaging::new(work.path(), 1024).unwrap();

        let path = staging.stage(b"not really a video", VideoContainer::Mp4).await.unwrap();
        assert!(path.starts_with(staging.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mp4"));
        assert_eq!(std::fs::read(&path).unwrap(), b"not really a video");
    }

    #[tokio::test]
    async fn test_stage_is_idempotent() {
        let work = tempfile::tempdir().unwrap();
        let mut staging = UploadStaging::new(work.path(), 1024).unwrap();

        let first = staging.stage(b"same bytes", VideoContainer::Mov).await.unwrap();
        let second = staging.stage(b"same bytes", VideoContainer::Mov).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(staging.len(), 1);
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 1);

        let other = staging.stage(b"other bytes", VideoContainer::Mov).await.unwrap();
        assert_ne!(first, other);
        assert_eq!(staging.len(), 2);
    }

    #[tokio::test]
    async fn test_stage_same_bytes_under_another_container() {
        let work = tempfile::tempdir().unwrap();
        let mut staging = UploadStaging::new(work.path(), 1024).unwrap();

        let as_mp4 = staging.stage(b"same bytes", VideoContainer::Mp4).await.unwrap();
        let as_mov = staging.stage(b"same bytes", VideoContainer::Mov).await.unwrap();
        assert_eq!(as_mp4, as_mov);
        assert_eq!(as_mov.extension().and_then(|e| e.to_str()), Some("mp4"));
        assert_eq!(staging.len(), 1);
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_stage_limits() {
        let work = tempfile::tempdir().unwrap();
        let mut staging = UploadStaging::new(work.path(), 4).unwrap();

        assert!(matches!(
            staging.stage(b"", VideoContainer::Mp4).await,
            Err(StagingError::Empty)
        ));
        assert!(matches!(
            staging.stage(b"12345", VideoContainer::Mp4).await,
            Err(StagingError::TooLarge { size: 5, max: 4 })
        ));
        assert!(staging.is_empty());
    }

    #[tokio::test]
    async fn test_staging_dir_removed_on_drop() {
        let work = tempfile::tempdir().unwrap();
        let mut staging = UploadStaging::new(work.path(), 1024).unwrap();
        staging.stage(b"clip", VideoContainer::Avi).await.unwrap();
        let dir = staging.path().to_path_buf();

        drop(staging);
        assert!(!dir.exists());
    }
}
