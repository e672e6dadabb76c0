//! Splits an oversized audio asset into fixed-duration windows sized for
//! one transcription call each.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use super::fetch::AudioAsset;
use crate::error::PipelineError;

/// One time-bounded slice `[start_secs, end_secs)` of an audio asset.
///
/// Chunks of one asset are contiguous, non-overlapping, and ordered by
/// `index`; reassembly is always index order.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub index: usize,
    pub path: PathBuf,
    pub start_secs: f64,
    pub end_secs: f64,
}

/// Cuts a single `[start, start + duration)` window of a source file into
/// its own decodable audio file.
#[cfg_attr(test, mockall::automock)]
pub trait ChunkEncoder {
    fn encode_window(
        &self,
        src: &Path,
        start_secs: f64,
        duration_secs: f64,
        out: &Path,
    ) -> io::Result<()>;
}

/// Real encoder backed by the ffmpeg CLI.
pub struct FfmpegEncoder;

impl ChunkEncoder for FfmpegEncoder {
    fn encode_window(
        &self,
        src: &Path,
        start_secs: f64,
        duration_secs: f64,
        out: &Path,
    ) -> io::Result<()> {
        let output = Command::new("ffmpeg")
            .arg("-y")
            .arg("-ss")
            .arg(start_secs.to_string())
            .arg("-t")
            .arg(duration_secs.to_string())
            .arg("-i")
            .arg(src)
            .arg(out)
            .output()?;
        if !output.status.success() {
            return Err(io::Error::other(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Contiguous `[start, end)` windows of at most `window_secs` covering
/// `[0, duration_secs)` exactly once each. Produces `ceil(D/W)` windows.
pub fn plan_windows(duration_secs: f64, window_secs: u64) -> Vec<(f64, f64)> {
    let window = window_secs as f64;
    let mut windows = Vec::new();
    let mut start = 0.0;
    while start < duration_secs {
        let end = (start + window).min(duration_secs);
        windows.push((start, end));
        start = end;
    }
    windows
}

/// Split `asset` for transcription.
///
/// At or under `limit_bytes` the asset is returned whole as a single chunk
/// and no file is written. Above the limit the asset is cut into
/// fixed-duration windows, one file per window under `work_dir`, in index
/// order.
///
/// Windows are time-based, not byte-based: a window of unusually
/// high-bitrate audio can still exceed `limit_bytes`. That case is not
/// detected here; the transcription service rejects the oversized chunk
/// and the run fails with that chunk's index.
pub fn split(
    asset: &AudioAsset,
    limit_bytes: u64,
    window_secs: u64,
    work_dir: &Path,
    encoder: &dyn ChunkEncoder,
) -> Result<Vec<AudioChunk>, PipelineError> {
    if asset.size_bytes <= limit_bytes {
        debug!(
            "{} bytes is within the {} byte payload limit, not splitting",
            asset.size_bytes, limit_bytes
        );
        return Ok(vec![AudioChunk {
            index: 0,
            path: asset.path.clone(),
            start_secs: 0.0,
            end_secs: asset.duration_secs,
        }]);
    }

    let windows = plan_windows(asset.duration_secs, window_secs);
    info!(
        "splitting {} ({} bytes) into {} window(s) of up to {}s",
        asset.path.display(),
        asset.size_bytes,
        windows.len(),
        window_secs
    );

    let mut chunks = Vec::with_capacity(windows.len());
    for (index, (start, end)) in windows.into_iter().enumerate() {
        let path = work_dir.join(format!("chunk_{:04}.mp3", index));
        encoder
            .encode_window(&asset.path, start, end - start, &path)
            .map_err(|e| {
                PipelineError::Chunking(format!(
                    "window {} [{:.1}s, {:.1}s): {}",
                    index, start, end, e
                ))
            })?;
        chunks.push(AudioChunk {
            index,
            path,
            start_secs: start,
            end_secs: end,
        });
    }
    Ok(chunks)
}
