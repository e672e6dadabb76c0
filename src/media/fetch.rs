//! Audio-fetch collaborator: turns a video URL into a local audio file.
//!
//! The real implementation shells out to yt-dlp for the download and
//! ffprobe for the duration. Anything honoring the [`AudioFetcher`]
//! contract is substitutable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use thiserror::Error;

/// A downloaded audio file with its measured size and duration.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_secs: f64,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not invoke {0}: {1}")]
    Invoke(&'static str, #[source] io::Error),
    #[error("{0} failed: {1}")]
    Tool(&'static str, String),
    #[error("downloaded audio missing at {0}")]
    MissingOutput(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Downloads the audio track of a video into a caller-owned directory.
#[cfg_attr(test, mockall::automock)]
pub trait AudioFetcher {
    fn fetch(&self, url: &str, dest_dir: &Path) -> Result<AudioAsset, FetchError>;
}

/// Real fetcher backed by the yt-dlp CLI (best audio, mp3 postprocessing).
pub struct YtDlpFetcher;

impl AudioFetcher for YtDlpFetcher {
    fn fetch(&self, url: &str, dest_dir: &Path) -> Result<AudioAsset, FetchError> {
        let audio_path = dest_dir.join("audio.mp3");
        let template = dest_dir.join("audio.%(ext)s");

        info!("downloading audio for {}", url);
        let output = Command::new("yt-dlp")
            .arg("--quiet")
            .arg("--format")
            .arg("bestaudio/best")
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--output")
            .arg(&template)
            .arg(url)
            .output()
            .map_err(|e| FetchError::Invoke("yt-dlp", e))?;
        if !output.status.success() {
            return Err(FetchError::Tool(
                "yt-dlp",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        if !audio_path.exists() {
            return Err(FetchError::MissingOutput(audio_path));
        }

        let size_bytes = fs::metadata(&audio_path)?.len();
        let duration_secs = probe_duration(&audio_path)?;
        debug!(
            "fetched {} ({} bytes, {:.1}s)",
            audio_path.display(),
            size_bytes,
            duration_secs
        );

        Ok(AudioAsset {
            path: audio_path,
            size_bytes,
            duration_secs,
        })
    }
}

/// Read a media file's duration in seconds via ffprobe.
pub fn probe_duration(path: &Path) -> Result<f64, FetchError> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(path)
        .output()
        .map_err(|e| FetchError::Invoke("ffprobe", e))?;
    if !output.status.success() {
        return Err(FetchError::Tool(
            "ffprobe",
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_duration_output(&stdout)
        .ok_or_else(|| FetchError::Tool("ffprobe", format!("unparseable duration {:?}", stdout.trim())))
}

fn parse_duration_output(stdout: &str) -> Option<f64> {
    stdout.trim().parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)
}
