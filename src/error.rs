//! Top-level error taxonomy for one pipeline run.

use thiserror::Error;

use crate::media::fetch::FetchError;
use crate::transcribe::TranscriptionError;

/// Everything that can abort a pipeline run. Nothing is retried; every
/// variant terminates the run, and temporary audio artifacts are removed
/// regardless of which variant fired.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unrecognized video URL: {0}")]
    InvalidUrl(String),

    #[error("API key not configured")]
    MissingCredential,

    #[error("audio download failed: {0}")]
    Download(#[from] FetchError),

    #[error("audio chunking failed: {0}")]
    Chunking(String),

    #[error("transcription failed on chunk {chunk_index}: {source}")]
    Transcription {
        chunk_index: usize,
        #[source]
        source: TranscriptionError,
    },

    #[error("cache I/O failed: {0}")]
    CacheIo(#[from] std::io::Error),
}

impl PipelineError {
    /// Returns a user-friendly message suitable for printing to stderr.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::InvalidUrl(url) => {
                format!("Unrecognized video URL: {}", url)
            }
            PipelineError::MissingCredential => {
                "No OpenAI API key provided. Pass --api-key or set OPENAI_API_KEY.".to_string()
            }
            PipelineError::Download(e) => {
                format!("Audio download failed: {}", e)
            }
            PipelineError::Chunking(msg) => {
                format!("Audio splitting failed: {}", msg)
            }
            PipelineError::Transcription {
                chunk_index,
                source,
            } => {
                let msg = source.to_string();
                if msg.contains("401") {
                    "Invalid API key. Check your credentials.".to_string()
                } else if msg.contains("429") || msg.to_lowercase().contains("rate limit") {
                    "Rate limit reached. Please wait and retry.".to_string()
                } else {
                    // 1-based for humans
                    format!("Transcription failed on chunk {}: {}", chunk_index + 1, source)
                }
            }
            PipelineError::CacheIo(e) => {
                format!("Could not read or write the transcript cache: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_get_a_specific_message() {
        let err = PipelineError::Transcription {
            chunk_index: 0,
            source: TranscriptionError::ApiError("API returned status 401: unauthorized".into()),
        };
        assert_eq!(err.user_message(), "Invalid API key. Check your credentials.");
    }

    #[test]
    fn chunk_index_is_reported_one_based() {
        let err = PipelineError::Transcription {
            chunk_index: 2,
            source: TranscriptionError::ApiError("server melted".into()),
        };
        assert!(err.user_message().contains("chunk 3"));
    }
}
