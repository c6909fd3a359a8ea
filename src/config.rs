use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Configuration for the video transcriber
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transcription service settings
    pub transcription: TranscriptionConfig,

    /// Output and storage settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// API endpoint for the transcription service
    pub api_endpoint: String,

    /// API key for the transcription service
    pub api_key: Option<String>,

    /// Model to use for transcription
    pub model: String,

    /// Language hint for transcription
    pub language: Option<String>,

    /// Timeout for transcription requests (seconds, 0 = none)
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory where transcript files are written
    pub base_dir: PathBuf,
}

impl Config {
    /// Load configuration from file, falling back to defaults.
    ///
    /// Environment variables always win over file values, so a bare
    /// `OPENAI_API_KEY` export is enough to run without any file.
    pub fn load() -> Self {
        let config_paths = [
            "video-transcriber.toml",
            "config/video-transcriber.toml",
        ];

        let mut config = Self::default();
        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(parsed) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config = parsed;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        config.apply_env();
        config
    }

    /// Override config values from environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            if !api_key.is_empty() {
                self.transcription.api_key = Some(api_key);
            }
        }
        if let Ok(output_dir) = std::env::var("TRANSCRIBER_OUTPUT_DIR") {
            self.output.base_dir = PathBuf::from(output_dir);
        }
    }

    /// The configured API key, or a fail-fast error when absent.
    ///
    /// Called before any job is claimed so a missing credential never
    /// becomes a per-job failure.
    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        self.transcription
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transcription: TranscriptionConfig {
                api_endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
                api_key: None,
                model: "whisper-1".to_string(),
                language: None,
                timeout: 0,
            },
            output: OutputConfig {
                base_dir: PathBuf::from("./output"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_whisper() {
        let config = Config::default();
        assert_eq!(config.transcription.model, "whisper-1");
        assert!(config
            .transcription
            .api_endpoint
            .contains("audio/transcriptions"));
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let mut config = Config::default();
        config.transcription.api_key = None;
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn present_api_key_passes() {
        let mut config = Config::default();
        config.transcription.api_key = Some("sk-test".to_string());
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }
}
