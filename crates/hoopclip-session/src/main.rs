//! hoopclip command-line tool.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hoopclip_media::{check_ffmpeg, check_ffprobe};
use hoopclip_models::{format_seconds, ClipStatus, EventLabel};
use hoopclip_session::{parse_manifest, FailurePolicy, Session, SessionConfig, VideoContainer};

#[derive(Parser)]
#[command(name = "hoopclip")]
#[command(author, version, about = "Annotate basketball video and export highlight clips")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the events of a manifest as CSV
    Csv {
        /// JSON manifest of {label, start, end} entries
        #[arg(long)]
        events: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Cut one clip per event and zip them
    Clips {
        /// Source game video (mp4, mov, m4v or avi)
        #[arg(long)]
        video: PathBuf,

        /// JSON manifest of {label, start, end} entries
        #[arg(long)]
        events: PathBuf,

        /// Output archive
        #[arg(long, default_value = "highlights.zip")]
        out: PathBuf,

        /// Keep going past failed cuts and package the rest
        #[arg(long)]
        skip_failed: bool,

        /// Maximum concurrent cuts
        #[arg(long)]
        parallel: Option<usize>,
    },

    /// List the event labels
    Labels,

    /// Check that ffmpeg and ffprobe are available
    CheckTools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = SessionConfig::from_env();

    match cli.command {
        Commands::Csv { events, out } => write_csv(config, &events, out.as_deref()).await,
        Commands::Clips {
            video,
            events,
            out,
            skip_failed,
            parallel,
        } => {
            let mut config = config;
            if skip_failed {
                config = config.with_failure_policy(FailurePolicy::SkipFailed);
            }
            if let Some(parallel) = parallel {
                config.max_parallel_cuts = parallel.max(1);
            }
            write_clips(config, &video, &events, &out).await
        }
        Commands::Labels => {
            for label in EventLabel::ALL {
                println!("{}", label);
            }
            Ok(())
        }
        Commands::CheckTools => {
            let ffmpeg = check_ffmpeg(&config.ffmpeg_program)?;
            let ffprobe = check_ffprobe(&config.ffprobe_program)?;
            println!("ffmpeg: {}", ffmpeg.display());
            println!("ffprobe: {}", ffprobe.display());
            Ok(())
        }
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,hoopclip=info,hoopclip_session=info,hoopclip_media=info")
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Build a session and load every manifest entry into it.
async fn load_session(config: SessionConfig, manifest: &Path) -> anyhow::Result<Session> {
    let bytes = tokio::fs::read(manifest)
        .await
        .with_context(|| format!("Failed to read {}", manifest.display()))?;
    let entries = parse_manifest(&bytes)
        .with_context(|| format!("Invalid event manifest {}", manifest.display()))?;

    let mut session = Session::new(config).context("Failed to create session")?;
    for (i, entry) in entries.iter().enumerate() {
        session
            .add_event(
                entry.label.as_str(),
                &entry.start.as_text(),
                &entry.end.as_text(),
            )
            .with_context(|| format!("Event {} ({})", i + 1, entry.label))?;
    }

    for (n, event) in session.events().numbered() {
        info!(
            "#{} {} {} - {}",
            n,
            event.label,
            format_seconds(event.start_s),
            format_seconds(event.end_s)
        );
    }
    Ok(session)
}

async fn write_csv(config: SessionConfig, manifest: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let session = load_session(config, manifest).await?;
    if session.events().is_empty() {
        warn!("No events to export");
    }
    let artifact = session.export_csv()?;

    match out {
        Some(path) => {
            tokio::fs::write(path, &artifact.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} ({})", path.display(), artifact.mime_type);
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&artifact.bytes)?;
        }
    }
    Ok(())
}

async fn write_clips(
    config: SessionConfig,
    video: &Path,
    manifest: &Path,
    out: &Path,
) -> anyhow::Result<()> {
    if VideoContainer::from_path(video).is_none() {
        bail!("Unsupported video type: {}", video.display());
    }
    if !video.is_file() {
        bail!("Video not found: {}", video.display());
    }

    let mut session = load_session(config, manifest).await?;
    session.set_source(video);

    let cancel = session.cancel_handle();
    let shutdown = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, cancelling export");
            cancel.cancel();
        }
    });

    let result = session.export_clips().await;
    shutdown.abort();

    let bundle = match result {
        Ok(bundle) => bundle,
        Err(e) => {
            error!("Clip export failed: {}", e);
            return Err(e.into());
        }
    };

    for result in bundle.failures() {
        if let ClipStatus::Failure(reason) = &result.status {
            warn!("Clip {} skipped: {}", result.event_index, reason);
        }
    }

    tokio::fs::write(out, &bundle.archive.bytes)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!(
        "Wrote {} ({} bytes, {} clips)",
        out.display(),
        bundle.archive.bytes.len(),
        bundle.results.len() - bundle.failures().count()
    );
    Ok(())
}
