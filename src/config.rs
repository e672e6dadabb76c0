//! Run configuration, resolved once at startup and passed in explicitly.

use std::path::PathBuf;

/// Maximum payload the transcription service accepts per call.
pub const DEFAULT_PAYLOAD_LIMIT_BYTES: u64 = 25 * 1024 * 1024;

/// Length of one chunk window when an asset has to be split.
pub const DEFAULT_CHUNK_WINDOW_SECS: u64 = 300;

/// Settings for one pipeline run.
///
/// Everything the pipeline needs is carried here; no module below `main`
/// reads environment variables or other ambient process state.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the cache file and per-run scratch space.
    pub cache_dir: PathBuf,
    pub payload_limit_bytes: u64,
    pub chunk_window_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            payload_limit_bytes: DEFAULT_PAYLOAD_LIMIT_BYTES,
            chunk_window_secs: DEFAULT_CHUNK_WINDOW_SECS,
        }
    }
}
