use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::audio::AudioExtractor;
use crate::error::PipelineResult;
use crate::job::{Job, JobOutput};
use crate::transcription::srt;
use crate::transcription::{Transcriber, TranscriptWriter};

/// One job's trip through the pipeline.
///
/// Implementations return the complete output bundle on success or a
/// typed error; the worker loop turns the outcome into the job's state
/// transition. Nothing here mutates the job record itself.
#[async_trait]
pub trait ProcessJob: Send + Sync {
    async fn process(&self, job: &Job) -> PipelineResult<JobOutput>;
}

/// The real pipeline: audio extraction, then transcription, then
/// transcript rendering and output files. The duration probe lives in
/// the worker loop so a probed duration is committed even when a later
/// step fails.
pub struct Pipeline {
    extractor: AudioExtractor,
    transcriber: Arc<dyn Transcriber>,
    writer: TranscriptWriter,
}

impl Pipeline {
    pub fn new(
        extractor: AudioExtractor,
        transcriber: Arc<dyn Transcriber>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            extractor,
            transcriber,
            writer: TranscriptWriter::new(output_dir),
        }
    }
}

#[async_trait]
impl ProcessJob for Pipeline {
    async fn process(&self, job: &Job) -> PipelineResult<JobOutput> {
        // TempPath: the extracted audio is removed when `audio` drops,
        // on success and on every early return below.
        let audio = self.extractor.extract(&job.filepath).await?;

        let segments = self.transcriber.transcribe(&audio).await?;
        info!(
            "📝 {}: {} segment(s) transcribed",
            job.filename,
            segments.len()
        );

        let files = self.writer.write(&job.filename, job.id, &segments).await?;

        let transcript_text = srt::segments_to_text(&segments);
        let transcript_preview = srt::preview(&transcript_text);

        Ok(JobOutput {
            segments,
            transcript_text,
            transcript_preview,
            txt_path: files.txt_path,
            srt_path: files.srt_path,
            duration_seconds: job.duration_seconds,
        })
    }
}
