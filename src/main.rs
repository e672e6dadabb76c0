use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use secrecy::SecretString;

use vidscribe::media::chunk::FfmpegEncoder;
use vidscribe::media::fetch::YtDlpFetcher;
use vidscribe::notify::{BridgeNotifier, Notifier};
use vidscribe::transcribe::{OpenAiTranscriber, TranscriptionService};
use vidscribe::{Pipeline, Settings};

const USAGE: &str = "usage: vidscribe [--api-key KEY] [--cache-dir DIR] [--no-notify] URL

Fetches the video's audio track, transcribes it via the OpenAI Whisper
API, and prints the transcript. Results are cached on disk per video id;
a cached video never triggers a download or an API call again.

options:
  --api-key KEY     OpenAI API key (default: the OPENAI_API_KEY env var)
  --cache-dir DIR   transcript cache directory (default: ./cache)
  --no-notify       skip pushing the transcript to the local bridge";

struct CliArgs {
    url: String,
    api_key: Option<String>,
    cache_dir: Option<PathBuf>,
    no_notify: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut url = None;
    let mut api_key = None;
    let mut cache_dir = None;
    let mut no_notify = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--api-key" => {
                api_key = Some(args.next().ok_or("--api-key requires a value")?);
            }
            "--cache-dir" => {
                cache_dir = Some(PathBuf::from(
                    args.next().ok_or("--cache-dir requires a value")?,
                ));
            }
            "--no-notify" => no_notify = true,
            other if other.starts_with('-') => {
                return Err(format!("unknown flag: {}", other));
            }
            other => {
                if url.is_some() {
                    return Err("expected exactly one video URL".to_string());
                }
                url = Some(other.to_string());
            }
        }
    }

    Ok(CliArgs {
        url: url.ok_or("missing video URL")?,
        api_key,
        cache_dir,
        no_notify,
    })
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let raw: Vec<String> = env::args().skip(1).collect();
    if raw.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }
    let args = match parse_args(raw.into_iter()) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            return ExitCode::FAILURE;
        }
    };

    let mut settings = Settings::default();
    if let Some(dir) = args.cache_dir {
        settings.cache_dir = dir;
    }

    // The credential and the bridge endpoint are the only ambient state,
    // resolved here once; everything below main gets explicit values.
    let api_key = args.api_key.or_else(|| env::var("OPENAI_API_KEY").ok());
    let transcriber: Option<Box<dyn TranscriptionService>> = api_key.map(|key| {
        Box::new(OpenAiTranscriber::new(SecretString::from(key))) as Box<dyn TranscriptionService>
    });

    let notifier: Option<Box<dyn Notifier>> = if args.no_notify {
        None
    } else {
        env::var("VIDSCRIBE_BRIDGE_URL")
            .ok()
            .map(|endpoint| Box::new(BridgeNotifier::new(endpoint)) as Box<dyn Notifier>)
    };

    let pipeline = Pipeline::new(
        settings,
        Box::new(YtDlpFetcher),
        Box::new(FfmpegEncoder),
        transcriber,
        notifier,
    );

    match pipeline.run(&args.url) {
        Ok(transcript) => {
            println!("{}", transcript);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
