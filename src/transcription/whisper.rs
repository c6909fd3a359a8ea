use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranscriptionConfig;
use crate::error::{ConfigError, PipelineError, PipelineResult};
use crate::job::Segment;

/// Speech-to-text adapter: audio file in, ordered timed segments out.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> PipelineResult<Vec<Segment>>;
}

/// Client for the OpenAI Whisper transcription API.
#[derive(Debug, Clone)]
pub struct WhisperClient {
    config: TranscriptionConfig,
    api_key: String,
    client: reqwest::Client,
}

/// Verbose JSON response from the transcription endpoint.
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    segments: Vec<ApiSegment>,
}

#[derive(Debug, Deserialize)]
struct ApiSegment {
    start: f64,
    end: f64,
    text: String,
}

impl WhisperClient {
    /// Create a client, failing fast when no API key is configured.
    pub fn new(config: TranscriptionConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut builder = reqwest::Client::builder();
        if config.timeout > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout));
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    /// Upload the audio file and return its timed segments in order.
    async fn transcribe(&self, audio_path: &Path) -> PipelineResult<Vec<Segment>> {
        info!("🎤 Transcribing {}", audio_path.display());

        let audio_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let file_part = Part::bytes(audio_bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")
            .map_err(|e| PipelineError::TranscriptionFailed(e.to_string()))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json");
        if let Some(language) = &self.config.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(&self.config.api_endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::TranscriptionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read response body>".to_string());
            return Err(PipelineError::TranscriptionFailed(format!(
                "HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        let parsed: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| PipelineError::TranscriptionFailed(e.to_string()))?;

        debug!("Received {} segment(s)", parsed.segments.len());

        Ok(parsed
            .segments
            .into_iter()
            .map(|seg| Segment::new(seg.start, seg.end, seg.text))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> TranscriptionConfig {
        TranscriptionConfig {
            api_endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            api_key: api_key.map(str::to_string),
            model: "whisper-1".to_string(),
            language: None,
            timeout: 0,
        }
    }

    #[test]
    fn missing_key_fails_fast() {
        assert!(matches!(
            WhisperClient::new(config(None)),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            WhisperClient::new(config(Some(""))),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn present_key_constructs() {
        assert!(WhisperClient::new(config(Some("sk-test"))).is_ok());
    }

    #[test]
    fn verbose_json_parses_ordered_segments() {
        let raw = r#"{
            "task": "transcribe",
            "language": "english",
            "duration": 2.0,
            "text": "Hello world",
            "segments": [
                {"id": 0, "start": 0.0, "end": 1.0, "text": " Hello ", "avg_logprob": -0.2},
                {"id": 1, "start": 1.0, "end": 2.0, "text": "world", "no_speech_prob": 0.01}
            ]
        }"#;
        let parsed: VerboseTranscription = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.segments.len(), 2);
        assert_eq!(parsed.segments[0].text, " Hello ");
        assert_eq!(parsed.segments[1].start, 1.0);
    }

    #[tokio::test]
    async fn missing_audio_file_surfaces_io_error() {
        let client = WhisperClient::new(config(Some("sk-test"))).unwrap();
        let err = client
            .transcribe(Path::new("/no/such/audio.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
