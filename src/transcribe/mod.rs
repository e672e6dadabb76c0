//! Transcription collaborator: one audio file in, its text out.

mod openai;

pub use openai::OpenAiTranscriber;

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("audio file not found: {0}")]
    FileNotFound(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One transcription call against the speech-to-text service.
///
/// Callers are responsible for keeping each file under the service's
/// payload ceiling; oversized audio must be chunked beforehand.
#[cfg_attr(test, mockall::automock)]
pub trait TranscriptionService: Send + Sync {
    fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError>;
}
