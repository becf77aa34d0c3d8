use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language hint for recognition engines (ISO code, or "auto")
    #[serde(default = "default_language")]
    pub language: String,

    /// Compute device preference for transcription backends
    #[serde(default)]
    pub device: DevicePreference,

    /// Time budget per extraction tier in seconds (0 disables the limit)
    #[serde(default = "default_tier_timeout_secs")]
    pub tier_timeout_secs: u64,

    /// Optical detection and extraction settings
    #[serde(default)]
    pub optical: OpticalConfig,

    /// Quality gate thresholds for primary-ASR output
    #[serde(default)]
    pub quality: QualityThresholds,

    /// Recognition engine settings
    #[serde(default)]
    pub engines: EnginesConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Compute device preference for transcription backends
///
/// A request for hardware acceleration that cannot be satisfied degrades to
/// general-purpose computation inside the backend; the degradation is never
/// surfaced as an error.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    // @device: Let the backend pick
    #[default]
    Auto,
    // @device: Prefer a hardware accelerator
    Gpu,
    // @device: Force general-purpose computation
    Cpu,
}

impl DevicePreference {
    // @returns: Lowercase device identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
        }
    }
}

impl std::fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DevicePreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "gpu" | "cuda" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            _ => Err(anyhow!("Invalid device preference: {}", s)),
        }
    }
}

/// Optical tier configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpticalConfig {
    // @field: Fixed timestamps sampled during burned-caption detection, seconds
    #[serde(default = "default_sample_offsets_secs")]
    pub sample_offsets_secs: Vec<f64>,

    // @field: Sampling interval for full-duration extraction, seconds
    #[serde(default = "default_extraction_interval_secs")]
    pub extraction_interval_secs: f64,

    // @field: Max frames captured and recognized concurrently
    #[serde(default = "default_optical_concurrency")]
    pub concurrency: usize,
}

impl Default for OpticalConfig {
    fn default() -> Self {
        OpticalConfig {
            sample_offsets_secs: default_sample_offsets_secs(),
            extraction_interval_secs: default_extraction_interval_secs(),
            concurrency: default_optical_concurrency(),
        }
    }
}

/// Quality gate thresholds
///
/// The defaults are inherited heuristics, preserved as tunable values rather
/// than derived ones.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QualityThresholds {
    // @field: Minimum cue count
    #[serde(default = "default_min_count")]
    pub min_count: usize,

    // @field: Maximum repetition rate over non-trivial texts
    #[serde(default = "default_max_repetition_rate")]
    pub max_repetition_rate: f64,

    // @field: Maximum run of adjacent identical cues
    #[serde(default = "default_max_consecutive_same")]
    pub max_consecutive_same: usize,

    // @field: Minimum mean character length of trimmed cue text
    #[serde(default = "default_min_avg_length")]
    pub min_avg_length: f64,

    // @field: Maximum fraction of near-empty cues
    #[serde(default = "default_max_empty_fraction")]
    pub max_empty_fraction: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        QualityThresholds {
            min_count: default_min_count(),
            max_repetition_rate: default_max_repetition_rate(),
            max_consecutive_same: default_max_consecutive_same(),
            min_avg_length: default_min_avg_length(),
            max_empty_fraction: default_max_empty_fraction(),
        }
    }
}

/// Recognition engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EnginesConfig {
    // @field: Image-to-text binary
    #[serde(default = "default_tesseract_bin")]
    pub tesseract_bin: String,

    // @field: Model file for the in-process primary transcriber
    #[serde(default = "default_whisper_model_path")]
    pub whisper_model_path: String,

    // @field: Fallback transcriber binary
    #[serde(default = "default_whisper_cli_bin")]
    pub whisper_cli_bin: String,

    // @field: Model name passed to the fallback transcriber
    #[serde(default = "default_whisper_cli_model")]
    pub whisper_cli_model: String,
}

impl Default for EnginesConfig {
    fn default() -> Self {
        EnginesConfig {
            tesseract_bin: default_tesseract_bin(),
            whisper_model_path: default_whisper_model_path(),
            whisper_cli_bin: default_whisper_cli_bin(),
            whisper_cli_model: default_whisper_cli_model(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            language: default_language(),
            device: DevicePreference::default(),
            tier_timeout_secs: default_tier_timeout_secs(),
            optical: OpticalConfig::default(),
            quality: QualityThresholds::default(),
            engines: EnginesConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Validate the configuration after loading and CLI overrides
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::normalize_hint(&self.language)?;

        if self.optical.sample_offsets_secs.is_empty() {
            return Err(anyhow!("optical.sample_offsets_secs must not be empty"));
        }

        if self.optical.extraction_interval_secs <= 0.0 {
            return Err(anyhow!(
                "optical.extraction_interval_secs must be positive, got {}",
                self.optical.extraction_interval_secs
            ));
        }

        if self.optical.concurrency == 0 {
            return Err(anyhow!("optical.concurrency must be at least 1"));
        }

        if !(0.0..=1.0).contains(&self.quality.max_repetition_rate) {
            return Err(anyhow!(
                "quality.max_repetition_rate must be within [0, 1], got {}",
                self.quality.max_repetition_rate
            ));
        }

        if !(0.0..=1.0).contains(&self.quality.max_empty_fraction) {
            return Err(anyhow!(
                "quality.max_empty_fraction must be within [0, 1], got {}",
                self.quality.max_empty_fraction
            ));
        }

        Ok(())
    }
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_tier_timeout_secs() -> u64 {
    1800
}

fn default_sample_offsets_secs() -> Vec<f64> {
    vec![60.0, 180.0, 300.0]
}

fn default_extraction_interval_secs() -> f64 {
    5.0
}

fn default_optical_concurrency() -> usize {
    4
}

fn default_min_count() -> usize {
    10
}

fn default_max_repetition_rate() -> f64 {
    0.7
}

fn default_max_consecutive_same() -> usize {
    10
}

fn default_min_avg_length() -> f64 {
    2.0
}

fn default_max_empty_fraction() -> f64 {
    0.5
}

fn default_tesseract_bin() -> String {
    "tesseract".to_string()
}

fn default_whisper_model_path() -> String {
    "models/ggml-base.bin".to_string()
}

fn default_whisper_cli_bin() -> String {
    "whisper".to_string()
}

fn default_whisper_cli_model() -> String {
    "large".to_string()
}
