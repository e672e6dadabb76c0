//! End-to-end pipeline: URL → id → cache check → download → chunk →
//! transcribe → cache write-back.

use std::fs;

use log::{debug, info, warn};

use crate::cache::TranscriptCache;
use crate::config::Settings;
use crate::error::PipelineError;
use crate::media::chunk::{self, ChunkEncoder};
use crate::media::fetch::AudioFetcher;
use crate::notify::Notifier;
use crate::transcribe::TranscriptionService;
use crate::video_id::VideoId;

/// Coordinates the external collaborators for one video at a time.
///
/// Collaborators are injected as trait objects; `main` wires the real
/// yt-dlp/ffmpeg/OpenAI implementations, tests wire mocks. The transcriber
/// is optional because it can only be built with an API credential; a run
/// that needs it and finds `None` fails with `MissingCredential` before
/// any download happens.
pub struct Pipeline {
    settings: Settings,
    fetcher: Box<dyn AudioFetcher>,
    encoder: Box<dyn ChunkEncoder>,
    transcriber: Option<Box<dyn TranscriptionService>>,
    notifier: Option<Box<dyn Notifier>>,
}

impl Pipeline {
    pub fn new(
        settings: Settings,
        fetcher: Box<dyn AudioFetcher>,
        encoder: Box<dyn ChunkEncoder>,
        transcriber: Option<Box<dyn TranscriptionService>>,
        notifier: Option<Box<dyn Notifier>>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            encoder,
            transcriber,
            notifier,
        }
    }

    /// Run the whole pipeline for one video URL and return its transcript.
    ///
    /// A cache hit returns immediately without touching the network. On a
    /// miss the audio is downloaded into a run-scoped temp directory under
    /// the cache dir, split if it exceeds the payload ceiling, transcribed
    /// chunk by chunk in index order, and the joined text is flushed to
    /// the cache. Any failure aborts the run with nothing cached; the temp
    /// directory and every audio artifact in it are removed on success and
    /// failure paths alike.
    pub fn run(&self, url: &str) -> Result<String, PipelineError> {
        let id = VideoId::extract(url)?;

        fs::create_dir_all(&self.settings.cache_dir)?;
        let mut cache = TranscriptCache::load(&self.settings.cache_dir)?;
        if let Some(text) = cache.get(&id) {
            info!("cache hit for {}", id);
            return Ok(text.to_string());
        }

        // Fail before spending bandwidth on a download we could never use.
        let transcriber = self
            .transcriber
            .as_deref()
            .ok_or(PipelineError::MissingCredential)?;

        let work_dir = tempfile::Builder::new()
            .prefix("audio_")
            .tempdir_in(&self.settings.cache_dir)?;

        let asset = self.fetcher.fetch(url, work_dir.path())?;
        info!(
            "fetched {:.1}s of audio ({} bytes) for {}",
            asset.duration_secs, asset.size_bytes, id
        );

        let chunks = chunk::split(
            &asset,
            self.settings.payload_limit_bytes,
            self.settings.chunk_window_secs,
            work_dir.path(),
            self.encoder.as_ref(),
        )?;

        let mut texts = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            debug!(
                "transcribing chunk {} [{:.1}s, {:.1}s)",
                chunk.index, chunk.start_secs, chunk.end_secs
            );
            let text = transcriber.transcribe(&chunk.path).map_err(|source| {
                PipelineError::Transcription {
                    chunk_index: chunk.index,
                    source,
                }
            })?;
            texts.push(text);

            // Each chunk file is consumed exactly once; drop it as soon as
            // its text is in hand. The unsplit asset is the work dir's.
            if chunk.path != asset.path {
                if let Err(e) = fs::remove_file(&chunk.path) {
                    warn!("could not remove chunk file {}: {}", chunk.path.display(), e);
                }
            }
        }
        let transcript = texts.join(" ");

        cache.put(&id, transcript.clone());
        cache.flush()?;

        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify(&id, &transcript) {
                warn!("notification failed (transcript already cached): {}", e);
            }
        }

        Ok(transcript)
        // work_dir drops here and on every early return above, removing the
        // downloaded asset and any residual chunk files.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    use crate::media::chunk::MockChunkEncoder;
    use crate::media::fetch::{AudioAsset, MockAudioFetcher};
    use crate::notify::{MockNotifier, NotifyError};
    use crate::transcribe::{MockTranscriptionService, TranscriptionError};

    const MIB: u64 = 1024 * 1024;

    struct Mocks {
        fetcher: MockAudioFetcher,
        encoder: MockChunkEncoder,
        transcriber: MockTranscriptionService,
        notifier: Option<MockNotifier>,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                fetcher: MockAudioFetcher::new(),
                encoder: MockChunkEncoder::new(),
                transcriber: MockTranscriptionService::new(),
                notifier: None,
            }
        }

        fn into_pipeline(self, cache_dir: &Path) -> Pipeline {
            let settings = Settings {
                cache_dir: cache_dir.to_path_buf(),
                ..Settings::default()
            };
            Pipeline::new(
                settings,
                Box::new(self.fetcher),
                Box::new(self.encoder),
                Some(Box::new(self.transcriber)),
                self.notifier.map(|n| Box::new(n) as Box<dyn Notifier>),
            )
        }
    }

    fn expect_no_external_calls(mocks: &mut Mocks) {
        mocks.fetcher.expect_fetch().times(0);
        mocks.encoder.expect_encode_window().times(0);
        mocks.transcriber.expect_transcribe().times(0);
    }

    fn seed_cache(dir: &Path, json: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(crate::cache::CACHE_FILE_NAME), json).unwrap();
    }

    fn small_asset(dest: &Path) -> AudioAsset {
        AudioAsset {
            path: dest.join("audio.mp3"),
            size_bytes: 3 * MIB,
            duration_secs: 95.0,
        }
    }

    #[test]
    fn cache_hit_skips_every_external_call() {
        let dir = tempfile::tempdir().unwrap();
        seed_cache(dir.path(), r#"{"XYZ123": "hello world"}"#);

        let mut mocks = Mocks::new();
        expect_no_external_calls(&mut mocks);
        let pipeline = mocks.into_pipeline(dir.path());

        let transcript = pipeline
            .run("https://example.com/watch?v=XYZ123&t=5s")
            .unwrap();
        assert_eq!(transcript, "hello world");
    }

    #[test]
    fn invalid_url_aborts_with_no_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        let mut mocks = Mocks::new();
        expect_no_external_calls(&mut mocks);
        let pipeline = mocks.into_pipeline(&cache_dir);

        let err = pipeline.run("https://example.com/video/12345").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidUrl(_)));
        assert!(!cache_dir.exists());
    }

    #[test]
    fn missing_credential_fails_before_any_download() {
        let dir = tempfile::tempdir().unwrap();

        let mut fetcher = MockAudioFetcher::new();
        fetcher.expect_fetch().times(0);
        let pipeline = Pipeline::new(
            Settings {
                cache_dir: dir.path().to_path_buf(),
                ..Settings::default()
            },
            Box::new(fetcher),
            Box::new(MockChunkEncoder::new()),
            None,
            None,
        );

        let err = pipeline.run("https://youtu.be/abc123").unwrap_err();
        assert!(matches!(err, PipelineError::MissingCredential));
    }

    #[test]
    fn small_asset_runs_as_one_chunk_and_is_cached() {
        let dir = tempfile::tempdir().unwrap();

        let mut mocks = Mocks::new();
        mocks
            .fetcher
            .expect_fetch()
            .withf(|url, _| url == "https://youtu.be/abc123")
            .times(1)
            .returning(|_, dest| Ok(small_asset(dest)));
        mocks.encoder.expect_encode_window().times(0);
        mocks
            .transcriber
            .expect_transcribe()
            .times(1)
            .returning(|_| Ok("the whole talk".to_string()));
        let pipeline = mocks.into_pipeline(dir.path());

        let transcript = pipeline.run("https://youtu.be/abc123").unwrap();
        assert_eq!(transcript, "the whole talk");

        let cache = TranscriptCache::load(dir.path()).unwrap();
        let id = VideoId::extract("https://youtu.be/abc123").unwrap();
        assert_eq!(cache.get(&id), Some("the whole talk"));
    }

    #[test]
    fn oversized_asset_is_transcribed_chunk_by_chunk_in_order() {
        let dir = tempfile::tempdir().unwrap();

        let mut mocks = Mocks::new();
        mocks.fetcher.expect_fetch().times(1).returning(|_, dest| {
            Ok(AudioAsset {
                path: dest.join("audio.mp3"),
                size_bytes: 30 * MIB,
                duration_secs: 650.0,
            })
        });
        mocks
            .encoder
            .expect_encode_window()
            .times(3)
            .returning(|_, _, _, _| Ok(()));
        mocks
            .transcriber
            .expect_transcribe()
            .times(3)
            .returning(|path| {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                Ok(match name.as_str() {
                    "chunk_0000.mp3" => "a".to_string(),
                    "chunk_0001.mp3" => "b".to_string(),
                    "chunk_0002.mp3" => "c".to_string(),
                    other => panic!("unexpected chunk file {}", other),
                })
            });
        let pipeline = mocks.into_pipeline(dir.path());

        let transcript = pipeline.run("https://youtu.be/longtalk").unwrap();
        assert_eq!(transcript, "a b c");
    }

    #[test]
    fn mid_run_transcription_failure_caches_nothing_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();

        let mut mocks = Mocks::new();
        mocks.fetcher.expect_fetch().times(1).returning(|_, dest| {
            Ok(AudioAsset {
                path: dest.join("audio.mp3"),
                size_bytes: 30 * MIB,
                duration_secs: 650.0,
            })
        });
        mocks
            .encoder
            .expect_encode_window()
            .times(3)
            .returning(|_, _, _, _| Ok(()));
        mocks
            .transcriber
            .expect_transcribe()
            .times(2)
            .returning(|path| {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                if name == "chunk_0001.mp3" {
                    Err(TranscriptionError::ApiError("server melted".into()))
                } else {
                    Ok("a".to_string())
                }
            });
        let pipeline = mocks.into_pipeline(dir.path());

        let err = pipeline.run("https://youtu.be/longtalk").unwrap_err();
        match err {
            PipelineError::Transcription { chunk_index, .. } => assert_eq!(chunk_index, 1),
            other => panic!("expected Transcription error, got {:?}", other),
        }

        // no cache entry was written for the failed run
        let cache = TranscriptCache::load(dir.path()).unwrap();
        let id = VideoId::extract("https://youtu.be/longtalk").unwrap();
        assert!(cache.get(&id).is_none());

        // the run-scoped work dir (and its chunk files) is gone
        let leftovers: Vec<PathBuf> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.is_dir())
            .collect();
        assert!(leftovers.is_empty(), "leftover work dirs: {:?}", leftovers);
    }

    #[test]
    fn download_failure_leaves_no_work_dir_behind() {
        let dir = tempfile::tempdir().unwrap();

        let mut mocks = Mocks::new();
        mocks.fetcher.expect_fetch().times(1).returning(|_, _| {
            Err(crate::media::fetch::FetchError::Tool(
                "yt-dlp",
                "video unavailable".to_string(),
            ))
        });
        mocks.encoder.expect_encode_window().times(0);
        mocks.transcriber.expect_transcribe().times(0);
        let pipeline = mocks.into_pipeline(dir.path());

        let err = pipeline.run("https://youtu.be/gone").unwrap_err();
        assert!(matches!(err, PipelineError::Download(_)));
        assert_eq!(
            fs::read_dir(dir.path())
                .unwrap()
                .filter(|e| e.as_ref().unwrap().path().is_dir())
                .count(),
            0
        );
    }

    #[test]
    fn warm_cache_rerun_makes_zero_external_calls() {
        let dir = tempfile::tempdir().unwrap();

        let mut mocks = Mocks::new();
        mocks
            .fetcher
            .expect_fetch()
            .times(1)
            .returning(|_, dest| Ok(small_asset(dest)));
        mocks.encoder.expect_encode_window().times(0);
        mocks
            .transcriber
            .expect_transcribe()
            .times(1)
            .returning(|_| Ok("once only".to_string()));
        let pipeline = mocks.into_pipeline(dir.path());

        let first = pipeline.run("https://youtu.be/abc123").unwrap();
        // second run must hit the cache; mock .times(1) bounds enforce it
        let second = pipeline.run("https://youtu.be/abc123").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn notifier_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();

        let mut mocks = Mocks::new();
        mocks
            .fetcher
            .expect_fetch()
            .times(1)
            .returning(|_, dest| Ok(small_asset(dest)));
        mocks.encoder.expect_encode_window().times(0);
        mocks
            .transcriber
            .expect_transcribe()
            .times(1)
            .returning(|_| Ok("notified text".to_string()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|id, transcript| id.as_str() == "abc123" && transcript == "notified text")
            .times(1)
            .returning(|_, _| {
                Err(NotifyError::Status(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                ))
            });
        mocks.notifier = Some(notifier);
        let pipeline = mocks.into_pipeline(dir.path());

        // the run still succeeds and the transcript is cached
        let transcript = pipeline.run("https://youtu.be/abc123").unwrap();
        assert_eq!(transcript, "notified text");
        let cache = TranscriptCache::load(dir.path()).unwrap();
        let id = VideoId::extract("https://youtu.be/abc123").unwrap();
        assert_eq!(cache.get(&id), Some("notified text"));
    }
}
