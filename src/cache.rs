//! Durable video-id → transcript mapping.
//!
//! The cache is a single pretty-printed JSON object on disk. It is read
//! once at the start of a run and written once at the end; there is no
//! incremental per-chunk persistence and no cross-process locking (two
//! concurrent runs for the same video both miss, and the last flush wins).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::PipelineError;
use crate::video_id::VideoId;

pub const CACHE_FILE_NAME: &str = "transcripts_cache.json";

#[derive(Debug)]
pub struct TranscriptCache {
    entries: BTreeMap<String, String>,
    path: PathBuf,
}

impl TranscriptCache {
    /// Load the cache from `dir/transcripts_cache.json`.
    ///
    /// A missing file is the first-run case and loads as an empty cache; a
    /// present but unreadable or malformed file is a real error.
    pub fn load(dir: &Path) -> Result<Self, PipelineError> {
        let path = dir.join(CACHE_FILE_NAME);
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                PipelineError::CacheIo(io::Error::other(format!(
                    "cache file {} is not valid JSON: {}",
                    path.display(),
                    e
                )))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(PipelineError::CacheIo(e)),
        };
        debug!(
            "loaded {} cached transcript(s) from {}",
            entries.len(),
            path.display()
        );
        Ok(Self { entries, path })
    }

    pub fn get(&self, id: &VideoId) -> Option<&str> {
        self.entries.get(id.as_str()).map(String::as_str)
    }

    pub fn put(&mut self, id: &VideoId, transcript: String) {
        self.entries.insert(id.as_str().to_string(), transcript);
    }

    /// Write the whole mapping to disk.
    ///
    /// Serializes to a sibling temp file first and renames it into place,
    /// so a crash mid-write cannot truncate the previous valid cache.
    pub fn flush(&self) -> Result<(), PipelineError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| PipelineError::CacheIo(io::Error::other(e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        info!(
            "flushed {} transcript(s) to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}
