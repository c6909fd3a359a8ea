use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One timed chunk of transcribed speech.
///
/// Order within a job's segment list is chronological and preserved
/// through serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Transcribed text
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Job status state machine.
///
/// Legal transitions:
/// - `Pending → Processing` (worker claims the job)
/// - `Processing → Done` (pipeline succeeded)
/// - `Processing → Failed` (any pipeline step failed)
/// - `Failed → Pending` (explicit retry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    /// Whether moving from `self` to `to` is a legal transition.
    pub fn can_transition(self, to: JobStatus) -> bool {
        matches!(
            (self, to),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Done)
                | (JobStatus::Processing, JobStatus::Failed)
                | (JobStatus::Failed, JobStatus::Pending)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Output fields populated together on a successful pipeline run.
///
/// Grouping them in one struct is what makes the success commit atomic:
/// a job either gets all of these or none of them.
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub segments: Vec<Segment>,
    pub transcript_text: String,
    pub transcript_preview: String,
    pub txt_path: PathBuf,
    pub srt_path: PathBuf,
    pub duration_seconds: Option<f64>,
}

/// One video's transcription work item and its persisted record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Store-assigned identifier (0 until inserted)
    pub id: u64,
    /// Video file name (for display and output naming)
    pub filename: String,
    /// Absolute video path, unique across all jobs
    pub filepath: PathBuf,
    /// Originating folder (or "uploads")
    pub folder: String,
    /// Video duration, probed lazily when unknown
    pub duration_seconds: Option<f64>,
    pub status: JobStatus,
    /// Set only when status is `Failed`
    pub error_message: Option<String>,
    /// Full concatenated transcript, set only on success
    pub transcript_text: Option<String>,
    /// First 200 characters of the transcript
    pub transcript_preview: Option<String>,
    /// Timed segments, set only on success
    pub segments: Option<Vec<Segment>>,
    pub txt_path: Option<PathBuf>,
    pub srt_path: Option<PathBuf>,
    /// Assignment time; defines FIFO processing order
    pub created_at: DateTime<Utc>,
    /// Set when the job leaves `Processing` (success or failure)
    pub processed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new pending job for a video file.
    pub fn new(filepath: PathBuf, folder: impl Into<String>) -> Self {
        let filename = filepath
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            id: 0,
            filename,
            filepath,
            folder: folder.into(),
            duration_seconds: None,
            status: JobStatus::Pending,
            error_message: None,
            transcript_text: None,
            transcript_preview: None,
            segments: None,
            txt_path: None,
            srt_path: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Mark the job claimed by the worker.
    pub fn begin_processing(&mut self) {
        debug_assert!(self.status.can_transition(JobStatus::Processing));
        self.status = JobStatus::Processing;
    }

    /// Commit a successful pipeline run: all output fields land together.
    pub fn complete(&mut self, output: JobOutput) {
        debug_assert!(self.status.can_transition(JobStatus::Done));
        self.segments = Some(output.segments);
        self.transcript_text = Some(output.transcript_text);
        self.transcript_preview = Some(output.transcript_preview);
        self.txt_path = Some(output.txt_path);
        self.srt_path = Some(output.srt_path);
        if output.duration_seconds.is_some() {
            self.duration_seconds = output.duration_seconds;
        }
        self.status = JobStatus::Done;
        self.processed_at = Some(Utc::now());
    }

    /// Record a pipeline failure. No partial outputs are attached.
    pub fn fail(&mut self, message: impl Into<String>) {
        debug_assert!(self.status.can_transition(JobStatus::Failed));
        self.status = JobStatus::Failed;
        self.error_message = Some(message.into());
        self.processed_at = Some(Utc::now());
    }

    /// Requeue a failed job. Keeps `created_at` (original queue position)
    /// and any probed duration; clears the failure bookkeeping.
    ///
    /// Returns `false` (leaving the job untouched) for any other status.
    pub fn reset_for_retry(&mut self) -> bool {
        if !self.status.can_transition(JobStatus::Pending) {
            return false;
        }
        self.status = JobStatus::Pending;
        self.error_message = None;
        self.processed_at = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<Segment> {
        vec![
            Segment::new(0.0, 1.0, " Hello "),
            Segment::new(1.0, 2.0, "world"),
        ]
    }

    fn output() -> JobOutput {
        JobOutput {
            segments: segments(),
            transcript_text: "Hello\nworld".to_string(),
            transcript_preview: "Hello\nworld".to_string(),
            txt_path: PathBuf::from("/out/a_transcript.txt"),
            srt_path: PathBuf::from("/out/a_transcript.srt"),
            duration_seconds: Some(2.0),
        }
    }

    #[test]
    fn only_four_transitions_are_legal() {
        use JobStatus::*;
        let all = [Pending, Processing, Done, Failed];
        for from in all {
            for to in all {
                let legal = matches!(
                    (from, to),
                    (Pending, Processing)
                        | (Processing, Done)
                        | (Processing, Failed)
                        | (Failed, Pending)
                );
                assert_eq!(from.can_transition(to), legal, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn success_populates_all_outputs_together() {
        let mut job = Job::new(PathBuf::from("/videos/a.mp4"), "/videos");
        job.begin_processing();
        job.complete(output());

        assert_eq!(job.status, JobStatus::Done);
        assert!(job.segments.is_some());
        assert!(job.transcript_text.is_some());
        assert!(job.transcript_preview.is_some());
        assert!(job.txt_path.is_some());
        assert!(job.srt_path.is_some());
        assert!(job.processed_at.is_some());
        assert_eq!(job.duration_seconds, Some(2.0));
    }

    #[test]
    fn failure_attaches_no_outputs() {
        let mut job = Job::new(PathBuf::from("/videos/a.mp4"), "/videos");
        job.begin_processing();
        job.fail("FFmpeg not found");

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("FFmpeg not found"));
        assert!(job.processed_at.is_some());
        assert!(job.segments.is_none());
        assert!(job.transcript_text.is_none());
        assert!(job.txt_path.is_none());
        assert!(job.srt_path.is_none());
    }

    #[test]
    fn retry_requeues_only_failed_jobs() {
        let mut job = Job::new(PathBuf::from("/videos/a.mp4"), "/videos");
        assert!(!job.reset_for_retry(), "pending jobs cannot be retried");

        job.begin_processing();
        assert!(!job.reset_for_retry(), "in-flight jobs cannot be retried");

        job.duration_seconds = Some(12.5);
        let created = job.created_at;
        job.fail("boom");
        assert!(job.reset_for_retry());
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.error_message.is_none());
        assert!(job.processed_at.is_none());
        assert_eq!(job.duration_seconds, Some(12.5));
        assert_eq!(job.created_at, created, "retry keeps queue position");
    }

    #[test]
    fn done_jobs_cannot_be_retried() {
        let mut job = Job::new(PathBuf::from("/videos/a.mp4"), "/videos");
        job.begin_processing();
        job.complete(output());
        assert!(!job.reset_for_retry());
        assert_eq!(job.status, JobStatus::Done);
    }

    #[test]
    fn segments_round_trip_in_order() {
        let original = segments();
        let json = serde_json::to_string(&original).unwrap();
        let parsed: Vec<Segment> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}
