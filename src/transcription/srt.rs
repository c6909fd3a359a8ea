use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::PipelineResult;
use crate::job::Segment;

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Hours are unbounded (no wrap at 24). Rounding rule: the value is
/// rounded to whole milliseconds first, then split, so a fraction that
/// rounds past a second boundary carries correctly
/// (`7199.9996` → `02:00:00,000`).
pub fn format_timestamp(seconds: f64) -> String {
    let total_millis = (seconds * 1000.0).round().max(0.0) as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Render segments as SRT subtitle content.
///
/// Each entry: 1-based index, `START --> END` line, trimmed text, blank
/// separator line.
pub fn render_srt(segments: &[Segment]) -> String {
    let mut content = String::new();
    for (i, seg) in segments.iter().enumerate() {
        content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(seg.start),
            format_timestamp(seg.end),
            seg.text.trim()
        ));
    }
    content
}

/// Render segments as plain text: one trimmed line per segment, each
/// line newline-terminated, no blank lines between entries.
pub fn render_text(segments: &[Segment]) -> String {
    let mut content = String::new();
    for seg in segments {
        content.push_str(seg.text.trim());
        content.push('\n');
    }
    content
}

/// Join segment text into a single plain-text string (no trailing
/// newline), the value persisted on the job record.
pub fn segments_to_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|seg| seg.text.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First `PREVIEW_LENGTH` characters of a transcript. Character
/// truncation, not segment-aware, so it may cut mid-word.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_LENGTH).collect()
}

/// Number of characters kept in a transcript preview.
pub const PREVIEW_LENGTH: usize = 200;

/// Writes the `.txt` and `.srt` transcript artifacts for a job.
#[derive(Debug, Clone)]
pub struct TranscriptWriter {
    output_dir: PathBuf,
}

/// Paths of the written transcript pair.
#[derive(Debug, Clone)]
pub struct TranscriptFiles {
    pub txt_path: PathBuf,
    pub srt_path: PathBuf,
}

impl TranscriptWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Write both transcript files for a job.
    ///
    /// Base name is the video's file name with the extension stripped
    /// plus a `_transcript` suffix. If either target already exists the
    /// job id is inserted before the suffix for both files, so jobs
    /// sharing a base name never overwrite each other.
    pub async fn write(
        &self,
        video_filename: &str,
        job_id: u64,
        segments: &[Segment],
    ) -> PipelineResult<TranscriptFiles> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let base = Path::new(video_filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| video_filename.to_string());

        let mut txt_path = self.output_dir.join(format!("{}_transcript.txt", base));
        let mut srt_path = self.output_dir.join(format!("{}_transcript.srt", base));

        if txt_path.exists() || srt_path.exists() {
            txt_path = self
                .output_dir
                .join(format!("{}_{}_transcript.txt", base, job_id));
            srt_path = self
                .output_dir
                .join(format!("{}_{}_transcript.srt", base, job_id));
        }

        tokio::fs::write(&txt_path, render_text(segments)).await?;
        tokio::fs::write(&srt_path, render_srt(segments)).await?;

        info!(
            "💾 Transcript saved: {} + {}",
            txt_path.display(),
            srt_path.display()
        );

        Ok(TranscriptFiles { txt_path, srt_path })
    }
}
