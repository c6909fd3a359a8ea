/// Result type for pipeline operations
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Error types for per-job pipeline steps.
///
/// Every variant is a per-job failure: the worker loop records it on the
/// job (`status = failed`, `error_message`) and moves on to the next
/// pending job. Nothing here aborts the loop.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("{tool} not found. Install it and ensure it is on your PATH")]
    ToolNotFound { tool: String },

    #[error("Audio extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors surfaced before any job is claimed (fail fast).
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY not set. Export it or add it to the config file")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_not_found_names_the_tool() {
        let err = PipelineError::ToolNotFound {
            tool: "ffmpeg".to_string(),
        };
        assert!(err.to_string().contains("ffmpeg"));
        assert!(err.to_string().contains("PATH"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PipelineError = io.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
