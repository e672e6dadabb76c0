//! Optional post-run hook that pushes a finished transcript into the
//! local browser-extension bridge.
//!
//! Failures here are the one non-fatal error path in the system: by the
//! time a notification fires the transcript is already durably cached, so
//! the pipeline logs a warning and moves on.

use log::info;
use serde_json::json;
use thiserror::Error;

use crate::video_id::VideoId;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("bridge request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("bridge returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Pushes a cached transcript into another local application's state.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn notify(&self, id: &VideoId, transcript: &str) -> Result<(), NotifyError>;
}

/// Posts `{"video_id", "transcript"}` as JSON to a local bridge endpoint.
pub struct BridgeNotifier {
    endpoint: String,
}

impl BridgeNotifier {
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }
}

impl Notifier for BridgeNotifier {
    fn notify(&self, id: &VideoId, transcript: &str) -> Result<(), NotifyError> {
        let response = reqwest::blocking::Client::new()
            .post(&self.endpoint)
            .json(&json!({
                "video_id": id.as_str(),
                "transcript": transcript,
            }))
            .send()?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status()));
        }
        info!("pushed transcript for {} to {}", id, self.endpoint);
        Ok(())
    }
}
