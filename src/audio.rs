use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::tools;

/// Extracts compressed audio from video files via ffmpeg and probes
/// durations via ffprobe.
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl AudioExtractor {
    /// Create an extractor with tools resolved from the host.
    pub fn new() -> Self {
        Self {
            ffmpeg: tools::resolve("ffmpeg"),
            ffprobe: tools::resolve("ffprobe"),
        }
    }

    /// Override the ffmpeg executable (tests, non-standard installs).
    pub fn with_ffmpeg(mut self, ffmpeg: PathBuf) -> Self {
        self.ffmpeg = ffmpeg;
        self
    }

    /// Override the ffprobe executable.
    pub fn with_ffprobe(mut self, ffprobe: PathBuf) -> Self {
        self.ffprobe = ffprobe;
        self
    }

    /// Extract the audio track of `video_path` to a uniquely-named
    /// temporary mp3 and return its path.
    ///
    /// The returned [`TempPath`] deletes the file when dropped, so the
    /// audio is cleaned up on every exit path of the caller.
    pub async fn extract(&self, video_path: &Path) -> PipelineResult<TempPath> {
        info!("🎵 Extracting audio from {}", video_path.display());

        let audio_path = tempfile::Builder::new()
            .prefix("transcriber_audio_")
            .suffix(".mp3")
            .tempfile()?
            .into_temp_path();

        let output = tokio::process::Command::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(video_path)
            .arg("-vn")
            .arg("-acodec")
            .arg("libmp3lame")
            .arg("-q:a")
            .arg("4")
            .arg(audio_path.as_os_str())
            .output()
            .await
            .map_err(|e| self.spawn_error("ffmpeg", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::ExtractionFailed(stderr.trim().to_string()));
        }

        debug!("Audio extracted to {}", audio_path.display());
        Ok(audio_path)
    }

    /// Probe the duration of a media file in seconds.
    ///
    /// Returns `None` on any failure: a missing duration is not a
    /// pipeline failure, just an unknown.
    pub async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let output = tokio::process::Command::new(&self.ffprobe)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path)
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                let stdout = String::from_utf8_lossy(&out.stdout);
                stdout.trim().parse::<f64>().ok()
            }
            Ok(out) => {
                debug!(
                    "ffprobe failed for {}: {}",
                    path.display(),
                    String::from_utf8_lossy(&out.stderr).trim()
                );
                None
            }
            Err(e) => {
                warn!("ffprobe unavailable: {}", e);
                None
            }
        }
    }

    fn spawn_error(&self, tool: &str, err: std::io::Error) -> PipelineError {
        if err.kind() == std::io::ErrorKind::NotFound {
            PipelineError::ToolNotFound {
                tool: tool.to_string(),
            }
        } else {
            PipelineError::Io(err)
        }
    }
}

impl Default for AudioExtractor {
    fn default() -> Self {
        Self::new()
    }
}
