// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::PathBuf;
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::app_config::{Config, DevicePreference};
use app_controller::Controller;

mod app_config;
mod app_controller;
mod engines;
mod errors;
mod extraction;
mod file_utils;
mod language_utils;
mod media;
mod subtitle_processor;

/// CLI Wrapper for DevicePreference to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliDevice {
    Auto,
    Gpu,
    Cpu,
}

impl From<CliDevice> for DevicePreference {
    fn from(cli_device: CliDevice) -> Self {
        match cli_device {
            CliDevice::Auto => DevicePreference::Auto,
            CliDevice::Gpu => DevicePreference::Gpu,
            CliDevice::Cpu => DevicePreference::Cpu,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract a subtitle track from a video (default command)
    Extract(ExtractArgs),

    /// Check the availability of the external tools and engines
    Doctor {
        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// Generate shell completions for subtier
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Input video file to process
    #[arg(value_name = "VIDEO_PATH")]
    input_path: PathBuf,

    /// Output subtitle path (default: derived from the video title)
    #[arg(value_name = "OUTPUT_SRT")]
    output_path: Option<PathBuf>,

    /// Language hint for recognition engines (e.g. 'en', 'zh', 'auto')
    #[arg(short, long)]
    language: Option<String>,

    /// Compute device preference for transcription
    #[arg(short, long, value_enum)]
    device: Option<CliDevice>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// subtier - tiered subtitle extraction
///
/// Acquires a subtitle track for a video by trying progressively more
/// expensive strategies: embedded stream, burned-in captions via OCR,
/// primary speech recognition (quality gated), fallback speech recognition.
#[derive(Parser, Debug)]
#[command(name = "subtier")]
#[command(version = "0.3.0")]
#[command(about = "Tiered subtitle extraction tool")]
#[command(long_about = "subtier acquires a subtitle track for a video, trying progressively more
expensive extraction strategies and falling through when a tier is
unavailable, fails, or produces a low-quality transcript.

EXAMPLES:
    subtier movie.mp4                        # Extract next to the video, name from the title
    subtier movie.mp4 out.srt                # Explicit output path
    subtier -l zh movie.mp4                  # Language hint for the recognizers
    subtier -d cpu movie.mp4                 # Force CPU transcription
    subtier doctor                           # Report tool and engine availability
    subtier completions bash > subtier.bash  # Generate bash completions

TIERS (in order):
    embedded      - pre-existing subtitle stream in the container
    ocr           - burned-in captions recognized from sampled frames
    asr-primary   - in-process whisper transcription, quality gated
    asr-fallback  - external whisper CLI transcription

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different file with --config-path. If the config file doesn't exist, a
    default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input video file to process
    #[arg(value_name = "VIDEO_PATH")]
    input_path: Option<PathBuf>,

    /// Output subtitle path (default: derived from the video title)
    #[arg(value_name = "OUTPUT_SRT")]
    output_path: Option<PathBuf>,

    /// Language hint for recognition engines (e.g. 'en', 'zh', 'auto')
    #[arg(short, long)]
    language: Option<String>,

    /// Compute device preference for transcription
    #[arg(short, long, value_enum)]
    device: Option<CliDevice>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subtier", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Doctor { config_path }) => {
            let config = load_or_create_config(&config_path, None, None, None)?;
            let controller = Controller::with_config(config)?;
            controller.run_doctor().await
        }
        Some(Commands::Extract(args)) => run_extract(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("VIDEO_PATH is required when no subcommand is specified")
            })?;

            let extract_args = ExtractArgs {
                input_path,
                output_path: cli.output_path,
                language: cli.language,
                device: cli.device,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_extract(extract_args).await
        }
    }
}

async fn run_extract(options: ExtractArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        apply_log_level(&cmd_log_level.clone().into());
    }

    let config = load_or_create_config(
        &options.config_path,
        options.language.as_deref(),
        options.device.clone(),
        options.log_level.clone(),
    )?;

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        apply_log_level(&config.log_level);
    }

    let controller = Controller::with_config(config)?;

    controller
        .run(&options.input_path, options.output_path.as_deref())
        .await?;

    Ok(())
}

/// Load the config file, creating a default one when it does not exist, and
/// apply the CLI overrides
fn load_or_create_config(
    config_path: &str,
    language: Option<&str>,
    device: Option<CliDevice>,
    log_level: Option<CliLogLevel>,
) -> Result<Config> {
    let mut config = if std::path::Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();

        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    if let Some(language) = language {
        config.language = language.to_string();
    }
    if let Some(device) = device {
        config.device = device.into();
    }
    if let Some(log_level) = log_level {
        config.log_level = log_level.into();
    }

    Ok(config)
}

fn apply_log_level(level: &app_config::LogLevel) {
    let filter = match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    };
    log::set_max_level(filter);
}
