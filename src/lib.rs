/// Video Transcriber
///
/// Converts video files into plain-text transcripts and SRT subtitles by
/// orchestrating ffmpeg audio extraction and a remote speech-to-text
/// service. A single-flight background worker drains a FIFO job queue,
/// one video at a time.
pub mod audio;
pub mod config;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod scan;
pub mod scheduler;
pub mod store;
pub mod tools;
pub mod transcription;

// Re-export main types for easy access
pub use crate::audio::AudioExtractor;
pub use crate::config::Config;
pub use crate::error::{ConfigError, PipelineError, PipelineResult};
pub use crate::job::{Job, JobOutput, JobStatus, Segment};
pub use crate::pipeline::{Pipeline, ProcessJob};
pub use crate::scheduler::Scheduler;
pub use crate::store::{JobStore, MemoryStore, StatusCounts};
pub use crate::transcription::{Transcriber, TranscriptWriter, WhisperClient};
