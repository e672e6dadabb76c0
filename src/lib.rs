//! Fetch a remote video's audio track, transcribe it through the OpenAI
//! Whisper API, and cache the transcript on disk keyed by video id.
//!
//! Audio larger than the API's payload ceiling is cut into fixed-duration
//! chunks, transcribed chunk by chunk in order, and reassembled into a
//! single transcript. A cache hit skips the download and every paid API
//! call entirely.

pub mod cache;
pub mod config;
pub mod error;
pub mod media;
pub mod notify;
pub mod pipeline;
pub mod transcribe;
pub mod video_id;

pub use config::Settings;
pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use video_id::VideoId;
