use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use std::path::PathBuf;
use tracing::info;

use video_transcriber::audio::AudioExtractor;
use video_transcriber::config::Config;
use video_transcriber::transcription::srt;
use video_transcriber::transcription::{Transcriber, WhisperClient};

/// Standalone single-video mode: transcribe one file and write the
/// `.txt`/`.srt` pair beside it.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "video_transcriber=info,warn".into()),
        )
        .init();

    let matches = Command::new("transcribe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Transcribe a video file using the OpenAI Whisper API")
        .arg(
            Arg::new("video")
                .value_name("VIDEO")
                .help("Path to the video file")
                .required(true),
        )
        .get_matches();

    let video_path = PathBuf::from(matches.get_one::<String>("video").unwrap());
    if !video_path.is_file() {
        return Err(anyhow!("File not found: {}", video_path.display()));
    }

    let config = Config::load();
    // Fail fast on the credential before any work happens.
    config.require_api_key()?;
    let transcriber = WhisperClient::new(config.transcription.clone())?;

    let base = video_path.with_extension("");
    let txt_path = PathBuf::from(format!("{}_transcript.txt", base.display()));
    let srt_path = PathBuf::from(format!("{}_transcript.srt", base.display()));

    info!("🎬 Transcribing {}", video_path.display());

    let extractor = AudioExtractor::new();
    // TempPath: the extracted audio is deleted when `audio` drops,
    // whether or not transcription succeeds.
    let audio = extractor.extract(&video_path).await?;
    let segments = transcriber.transcribe(&audio).await?;

    tokio::fs::write(&txt_path, srt::render_text(&segments)).await?;
    info!("💾 Transcript saved to {}", txt_path.display());
    tokio::fs::write(&srt_path, srt::render_srt(&segments)).await?;
    info!("💾 Subtitles saved to {}", srt_path.display());

    info!("🎉 Done: {} segment(s)", segments.len());
    Ok(())
}
