//! FFmpeg-backed sessions stopping their child processes.
//!
//! Stand-in `ffmpeg`/`ffprobe` shell scripts decide what to do from the
//! `-ss` offset they are invoked with.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use hoopclip_session::{ExportError, FailurePolicy, Session, SessionConfig};

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Session whose tools live in `bin`, with a stop grace long enough that
/// only a cooperating cutter finishes well inside it.
async fn session(work: &Path, bin: &Path, ffmpeg_body: &str) -> Session {
    let mut config = SessionConfig::default()
        .with_work_dir(work)
        .with_failure_policy(FailurePolicy::FailFast);
    config.max_parallel_cuts = 2;
    config.stop_grace = Duration::from_secs(20);
    config.ffmpeg_program = script(bin, "ffmpeg", ffmpeg_body);
    config.ffprobe_program = script(
        bin,
        "ffprobe",
        r#"echo '{"format": {"duration": "120.0"}}'"#,
    );

    let mut session = Session::new(config).unwrap();
    session.upload(b"fake game footage", "video/mp4").await.unwrap();
    session.add_event("Shot", "00:00", "00:05").unwrap();
    session.add_event("Foul/TO", "00:10", "00:12").unwrap();
    session
}

fn clip_dirs_left(work: &Path) -> usize {
    std::fs::read_dir(work)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("hoopclip-clips-"))
        .count()
}

#[tokio::test]
async fn test_cancel_kills_running_ffmpeg() {
    let work = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let session = session(work.path(), bin.path(), "sleep 60").await;

    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let err = session.export_clips().await.unwrap_err();
    assert!(matches!(err, ExportError::Cancelled));
    // Well under the stop grace: both cuts saw the flag and reaped FFmpeg.
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(clip_dirs_left(work.path()), 0);
}

#[tokio::test]
async fn test_fail_fast_stops_sibling_ffmpeg() {
    let work = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let ffmpeg = r#"case "$*" in
  *"-ss 10.000"*) echo "Invalid data found when processing input" >&2; exit 1 ;;
  *) sleep 60 ;;
esac"#;
    let session = session(work.path(), bin.path(), ffmpeg).await;

    let started = Instant::now();
    let err = session.export_clips().await.unwrap_err();
    match err {
        ExportError::Cut {
            event_index, label, ..
        } => {
            assert_eq!(event_index, 2);
            assert_eq!(label, "Foul/TO");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(clip_dirs_left(work.path()), 0);
}

#[tokio::test]
async fn test_export_after_fail_fast_runs_again() {
    let work = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let session = session(work.path(), bin.path(), "exit 1").await;

    assert!(matches!(
        session.export_clips().await,
        Err(ExportError::Cut { .. })
    ));

    // The raised stop flag is reset, so the next export cuts again instead
    // of reporting cancellation.
    assert!(matches!(
        session.export_clips().await,
        Err(ExportError::Cut { .. })
    ));
}
