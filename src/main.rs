//! subtrans - speech-to-subtitle translation
//!
//! Entry point: parses the command line, loads configuration, sets up
//! logging and runs the selected command until it finishes or Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subtrans::cli::{Args, Commands, TranslationArgs};
use subtrans::config::Config;
use subtrans::language::LanguagePair;
use subtrans::media::FfmpegExtractor;
use subtrans::pipeline::{self, Job, Pipeline};
use subtrans::provision::ModelProvisioner;
use subtrans::transcribe::{FasterWhisperTranscriber, TranscribeOptions};
use subtrans::translate::TranslatorFactory;

const DEFAULT_CONFIG_FILE: &str = "subtrans.toml";

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    };

    let guard = match setup_logging(args.verbose, &config.logging.dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    };

    let code = tokio::select! {
        result = execute(args.command, config) => match result {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("error: {:#}", e);
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("interrupted");
            130
        }
    };

    // flush the file appender before exiting
    drop(guard);
    std::process::exit(code);
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path).with_context(|| format!("loading {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Config::from_file(DEFAULT_CONFIG_FILE).with_context(|| format!("loading {}", DEFAULT_CONFIG_FILE))
        }
        None => Ok(Config::default()),
    }
}

fn apply_translation_args(config: &mut Config, args: &TranslationArgs) {
    if let Some(backend) = args.backend {
        config.translate.backend = backend;
    }
    if let Some(batch_size) = args.batch_size {
        config.translate.batch_size = batch_size;
    }
}

async fn execute(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Run {
            video,
            language,
            to,
            vad_ms,
            vad_threshold,
            no_vad,
            beam_size,
            translation,
            model,
            device,
            compute_type,
        } => {
            apply_translation_args(&mut config, &translation);
            let factory = TranslatorFactory::from_config(&config)?;
            if let Some(model) = model {
                config.transcriber.model = model;
            }
            if let Some(device) = device {
                config.transcriber.device = device;
            }
            if let Some(compute_type) = compute_type {
                config.transcriber.compute_type = compute_type;
            }

            let options = TranscribeOptions {
                language: None,
                vad_enabled: !no_vad,
                vad_min_silence_ms: vad_ms.unwrap_or(config.transcriber.vad_min_silence_ms),
                vad_threshold: vad_threshold.unwrap_or(config.transcriber.vad_threshold),
                beam_size: beam_size.unwrap_or(config.transcriber.beam_size),
            };
            let job = Job::new(video, &language, &to, options, config.media.sample_rate)?;

            let extractor = FfmpegExtractor::new(&config.media);
            extractor.check_availability().await?;
            let transcriber = FasterWhisperTranscriber::new(config.transcriber.clone());

            let pipeline = Pipeline::new(Box::new(extractor), Box::new(transcriber), Box::new(factory));
            let report = pipeline.run(&job).await?;

            println!("Original:   {}", report.original_path.display());
            println!("Translated: {} ({})", report.translated_path.display(), report.pair);
        }
        Commands::Translate {
            input,
            from,
            to,
            output,
            translation,
        } => {
            apply_translation_args(&mut config, &translation);
            let pair = LanguagePair::new(&from, &to)?;

            let factory = TranslatorFactory::from_config(&config)?;
            let output = pipeline::translate_srt(&factory, &input, &pair, output).await?;

            println!("Translated: {} ({})", output.display(), pair);
        }
        Commands::Pairs { available } => {
            let provisioner = ModelProvisioner::from_config(&config.provision, false)?;
            let pairs: Vec<LanguagePair> = if available {
                info!("Fetching package index {}", config.provision.index_url);
                provisioner.available_pairs().await?.into_iter().collect()
            } else {
                provisioner.installed_pairs()?
            };

            if pairs.is_empty() {
                println!("No language pairs found.");
            }
            for pair in pairs {
                println!("{}", pair);
            }
        }
        Commands::Install { from, to } => {
            let pair = LanguagePair::new(&from, &to)?;
            let provisioner = ModelProvisioner::from_config(&config.provision, config.translate.show_progress)?;
            let handle = provisioner.ensure(&pair).await?;

            println!("{} installed at {}", handle.pair, handle.install_path.display());
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool, log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    // Daily rotation
    let file_appender = rolling::daily(log_dir, "subtrans.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("installing the log subscriber")?;

    info!("Logging to {}", log_dir.display());
    Ok(guard)
}
