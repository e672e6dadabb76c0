//! OpenAI Whisper API client.

use std::path::Path;

use log::{error, info};
use reqwest::blocking::multipart;
use secrecy::{ExposeSecret, SecretString};

use super::{TranscriptionError, TranscriptionService};

const OPENAI_TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const OPENAI_MODEL: &str = "whisper-1";

pub struct OpenAiTranscriber {
    api_key: SecretString,
}

impl OpenAiTranscriber {
    pub fn new(api_key: SecretString) -> Self {
        Self { api_key }
    }

    fn build_form(&self, audio_path: &Path) -> Result<multipart::Form, TranscriptionError> {
        let form = multipart::Form::new()
            .file("file", audio_path)
            .map_err(TranscriptionError::Io)?
            .text("model", OPENAI_MODEL)
            .text("temperature", "0.0")
            .text("response_format", "json");
        Ok(form)
    }
}

impl TranscriptionService for OpenAiTranscriber {
    fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError> {
        if !audio_path.exists() {
            error!("audio file not found: {}", audio_path.display());
            return Err(TranscriptionError::FileNotFound(
                audio_path.to_string_lossy().to_string(),
            ));
        }

        let form = self.build_form(audio_path)?;
        let client = reqwest::blocking::Client::new();
        let response = client
            .post(OPENAI_TRANSCRIPTION_URL)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .map_err(|e| {
                error!("API request error: {}", e);
                TranscriptionError::ApiError(format!("request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .unwrap_or_else(|_| "unknown error".to_string());
            error!("API error response ({}): {}", status, error_text);
            return Err(TranscriptionError::ApiError(format!(
                "API returned status {}: {}",
                status, error_text
            )));
        }

        let json: serde_json::Value = response.json().map_err(|e| {
            error!("failed to parse response: {}", e);
            TranscriptionError::ApiError(format!("failed to parse response: {}", e))
        })?;
        let text = json["text"].as_str().unwrap_or("").to_string();

        info!("transcription successful: {} characters", text.len());
        Ok(text)
    }
}
