pub mod srt;
pub mod whisper;

pub use srt::{TranscriptFiles, TranscriptWriter};
pub use whisper::{Transcriber, WhisperClient};
