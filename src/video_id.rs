//! Canonical cache key derivation from video URLs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Canonical short key for a video, derived from its URL.
///
/// Two surface forms of the same video (watch page vs short link) extract
/// to the same id, so the cache never stores the same transcript twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the video id from a URL.
    ///
    /// Recognizes the long watch-page form (id in the `v=` query parameter,
    /// trailing `&...` parameters stripped) and the short-link form (id in
    /// the `youtu.be/` path, trailing `?...` stripped). Anything else is an
    /// `InvalidUrl` error. Pure: no I/O, no ambient state.
    pub fn extract(url: &str) -> Result<Self, PipelineError> {
        let candidate = if let Some((_, rest)) = url.split_once("v=") {
            rest.split('&').next().unwrap_or("")
        } else if let Some((_, rest)) = url.split_once("youtu.be/") {
            rest.split('?').next().unwrap_or("")
        } else {
            ""
        };

        if candidate.is_empty() {
            return Err(PipelineError::InvalidUrl(url.to_string()));
        }
        Ok(Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
