//! Local media handling: fetching a video's audio track and cutting it
//! into transcription-sized chunks.

pub mod chunk;
pub mod fetch;
