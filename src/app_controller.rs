use anyhow::{Result, Context, anyhow};
use log::{error, info, warn, debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use indicatif::{ProgressBar, ProgressStyle};

use crate::app_config::Config;
use crate::engines::tesseract::TesseractRecognizer;
use crate::engines::whisper_cli::WhisperCliTranscriber;
use crate::engines::whisper_local::{WhisperLocalConfig, WhisperLocalTranscriber};
use crate::engines::{TextRecognizer, Transcriber};
use crate::extraction::asr::AsrTier;
use crate::extraction::embedded::EmbeddedProbe;
use crate::extraction::optical::OpticalTier;
use crate::extraction::orchestrator::{ExtractionOutcome, Orchestrator};
use crate::extraction::quality::QualityAssessor;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::media::{self, VideoAsset};
use crate::subtitle_processor::TrackSource;

// @module: Application controller for subtitle extraction

/// Main application controller driving one extraction run per video
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Run one extraction: probe the asset, walk the tiers, write the artifact
    ///
    /// On success exactly one subtitle file exists at the chosen path and the
    /// producing mode is returned. On failure any partial file is removed and
    /// the error enumerates the attempted tiers.
    pub async fn run(&self, input_file: &Path, output_path: Option<&Path>) -> Result<TrackSource> {
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input video does not exist: {:?}", input_file));
        }

        let start_time = std::time::Instant::now();

        let asset = VideoAsset::open(input_file).await?;

        let output_path = match output_path {
            Some(path) => path.to_path_buf(),
            None => FileManager::derive_output_path(input_file, asset.title()),
        };
        info!("Output subtitle path: {:?}", output_path);

        let orchestrator = self.build_orchestrator()?;

        let spinner = Self::spinner();
        spinner.set_message("Extracting subtitles...");

        let result = orchestrator.run(&asset).await;
        spinner.finish_and_clear();

        match result {
            Ok(outcome) => {
                self.write_artifact(&outcome, &output_path)?;
                info!(
                    "Subtitle extraction succeeded in {} (mode: {}, {} cues) -> {:?}",
                    Self::format_duration(start_time.elapsed()),
                    outcome.mode,
                    outcome.track.len(),
                    output_path
                );
                Ok(outcome.mode)
            }
            Err(exhausted) => {
                // Nothing was written yet, but clear any partial artifact a
                // broken earlier run may have left at the same path
                if let Err(e) = FileManager::remove_file_if_exists(&output_path) {
                    warn!("Could not clean up partial artifact: {}", e);
                }
                error!("Subtitle extraction failed: {}", exhausted);
                Err(anyhow!("{}", exhausted))
            }
        }
    }

    /// Serialize the accepted track, removing the file again if the write dies midway
    fn write_artifact(&self, outcome: &ExtractionOutcome, output_path: &Path) -> Result<()> {
        if let Err(e) = outcome.track.write_to_srt(output_path) {
            let _ = FileManager::remove_file_if_exists(output_path);
            return Err(e).context("Failed to write subtitle artifact");
        }
        Ok(())
    }

    /// Wire the four tiers and the quality gate from the configuration
    fn build_orchestrator(&self) -> Result<Orchestrator> {
        let language_hint = language_utils::normalize_hint(&self.config.language)?;
        debug!("Language hint: {:?}", language_hint);

        let recognizer: Arc<dyn TextRecognizer> = Arc::new(TesseractRecognizer::new(
            &self.config.engines.tesseract_bin,
            language_hint.as_deref(),
        ));

        let primary: Arc<dyn Transcriber> = Arc::new(WhisperLocalTranscriber::new(WhisperLocalConfig {
            model_path: PathBuf::from(&self.config.engines.whisper_model_path),
            language: language_hint.clone(),
            device: self.config.device,
        }));

        let fallback: Arc<dyn Transcriber> = Arc::new(WhisperCliTranscriber::new(
            &self.config.engines.whisper_cli_bin,
            &self.config.engines.whisper_cli_model,
            language_hint,
            self.config.device,
        ));

        Ok(Orchestrator::new(
            Box::new(EmbeddedProbe::new()),
            Box::new(OpticalTier::new(recognizer, self.config.optical.clone())),
            Box::new(AsrTier::primary(primary)),
            Box::new(AsrTier::fallback(fallback)),
            QualityAssessor::with_thresholds(self.config.quality.clone()),
            self.config.tier_timeout_secs,
        ))
    }

    /// Report the availability of every external collaborator
    ///
    /// Returns an error when a required tool (ffmpeg/ffprobe) is missing;
    /// missing pluggable engines only degrade the corresponding tier.
    pub async fn run_doctor(&self) -> Result<()> {
        let mut required_ok = true;

        for (bin, version_arg) in [("ffmpeg", "-version"), ("ffprobe", "-version")] {
            match media::probe_tool_version(bin, version_arg).await {
                Ok(version) => info!("{}: {}", bin, version),
                Err(e) => {
                    error!("{}: not available ({})", bin, e);
                    required_ok = false;
                }
            }
        }

        match media::probe_tool_version(&self.config.engines.tesseract_bin, "--version").await {
            Ok(version) => info!("tesseract: {}", version),
            Err(_) => warn!(
                "tesseract: not available, burned-caption extraction will be skipped"
            ),
        }

        match media::probe_tool_version(&self.config.engines.whisper_cli_bin, "--help").await {
            Ok(_) => info!("whisper CLI: available"),
            Err(_) => warn!("whisper CLI: not available, the fallback transcriber will be skipped"),
        }

        let model_path = Path::new(&self.config.engines.whisper_model_path);
        if cfg!(feature = "whisper") {
            if model_path.exists() {
                info!("whisper model: {:?}", model_path);
            } else {
                warn!(
                    "whisper model missing at {:?}, the primary transcriber will be skipped",
                    model_path
                );
            }
        } else {
            warn!("built without the `whisper` feature, the primary transcriber will be skipped");
        }

        if required_ok {
            info!("Environment OK");
            Ok(())
        } else {
            Err(anyhow!("required media tools are missing"))
        }
    }

    fn spinner() -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(120));
        spinner
    }

    /// Format a duration as a compact human-readable string
    fn format_duration(duration: std::time::Duration) -> String {
        let total_secs = duration.as_secs();
        if total_secs >= 60 {
            format!("{}m{:02}s", total_secs / 60, total_secs % 60)
        } else {
            format!("{}.{:01}s", total_secs, duration.subsec_millis() / 100)
        }
    }
}
