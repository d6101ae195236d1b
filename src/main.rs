use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use narration_studio::config::{Language, StudioConfig};
use narration_studio::notification::LogProgressObserver;
use narration_studio::playback::SilentOutput;
use narration_studio::progress::{DefaultProgressReporter, ProcessStep, ProgressReporter, ProgressTracker};
use narration_studio::tts::{OpenAiSynthesizer, SynthesisRunStatus};
use narration_studio::utils::init_logger;
use narration_studio::{Collaborators, Session};

/// Синтез озвучки сценария по предложениям
#[derive(Parser, Debug)]
#[clap(name = "narrate", version)]
struct Args {
    /// Сценарий (.txt или .docx)
    script: PathBuf,

    /// JSON файл настроек
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(long)]
    voice: Option<String>,

    #[clap(long)]
    speed: Option<f32>,

    /// Код языка: ko, en, es, pt, fr
    #[clap(long)]
    language: Option<String>,

    /// Папка для аудио; по умолчанию папка сценария
    #[clap(long)]
    output: Option<PathBuf>,

    /// Склеить клипы в один файл после синтеза
    #[clap(long)]
    merge: bool,
}

fn load_config(args: &Args) -> Result<StudioConfig> {
    let mut config = match &args.config {
        Some(path) => StudioConfig::load(path).with_context(|| format!("reading {}", path.display()))?,
        None => StudioConfig::default(),
    }
    .with_env_overrides();

    if let Some(voice) = &args.voice {
        config.voice = voice.clone();
    }
    if let Some(speed) = args.speed {
        config.speed = speed;
    }
    if let Some(code) = &args.language {
        config.language = Language::from_code(code).ok_or_else(|| anyhow!("unknown language '{}'", code))?;
    }
    if let Some(folder) = &args.output {
        config.output_folder = Some(folder.clone());
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let config = load_config(&args)?;

    let default_folder = args
        .script
        .parent()
        .map(|folder| folder.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let synthesizer = OpenAiSynthesizer::new(config.openai.clone(), default_folder)?;
    let session = Session::new(config, Collaborators::new(Arc::new(synthesizer), Arc::new(SilentOutput)))?;

    let count = session.load_script(&args.script).await?;
    log::info!("{} sentences to synthesize", count);

    let reporter = Arc::new(DefaultProgressReporter::new());
    reporter.add_observer(Box::new(LogProgressObserver::with_prefix("[narrate] ")));
    let steps: &[ProcessStep] = if args.merge {
        &[ProcessStep::Synthesis, ProcessStep::AudioMerge]
    } else {
        &[ProcessStep::Synthesis]
    };
    let tracker = ProgressTracker::with_reporter(steps, reporter);

    let stop = session.stop_handle();
    let ctrl_c_handler = tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            log::warn!("Received Ctrl+C, stopping after the current sentence");
            stop.request_stop();
        }
    });

    let report = session.synthesize_all(Some(&tracker)).await;
    ctrl_c_handler.abort();
    let report = report?;
    println!("{}", report.message());

    for (i, clip) in session.clips().iter().enumerate() {
        match &clip.audio {
            Some(path) => println!("{:>4}  {}", i + 1, path.display()),
            None => println!("{:>4}  ({})", i + 1, clip.status.label()),
        }
    }

    if args.merge && report.status == SynthesisRunStatus::Completed {
        let merged = session.export_merged_audio(Some(&tracker)).await?;
        println!("Merged audio: {}", merged.display());
    }
    Ok(())
}
