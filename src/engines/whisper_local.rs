/*!
 * Primary speech recognition through in-process whisper-rs.
 *
 * Requires the `whisper` cargo feature (and cmake at build time). Without
 * the feature the type still exists as a stub that reports unavailability,
 * so the orchestrator routes straight to the fallback backend.
 */

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::app_config::DevicePreference;
use crate::errors::EngineError;
use crate::engines::{Transcriber, TranscriptSegment};

#[cfg(feature = "whisper")]
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: std::sync::Once = std::sync::Once::new();

/// Configuration for the in-process whisper backend
#[derive(Debug, Clone)]
pub struct WhisperLocalConfig {
    /// Path to the ggml model file
    pub model_path: PathBuf,
    /// Normalized ISO 639-1 language hint, `None` for auto-detection
    pub language: Option<String>,
    /// Compute device preference
    pub device: DevicePreference,
}

/// In-process whisper-rs transcriber, the primary backend
#[derive(Debug)]
pub struct WhisperLocalTranscriber {
    config: WhisperLocalConfig,
}

impl WhisperLocalTranscriber {
    /// Create a backend for the given configuration
    ///
    /// The model is loaded lazily on the first transcription, so creation
    /// never fails; `probe()` reports whether the engine can load at all.
    pub fn new(config: WhisperLocalConfig) -> Self {
        Self { config }
    }

    /// Backend configuration
    pub fn config(&self) -> &WhisperLocalConfig {
        &self.config
    }
}

#[cfg(feature = "whisper")]
#[async_trait]
impl Transcriber for WhisperLocalTranscriber {
    fn name(&self) -> &'static str {
        "whisper-local"
    }

    async fn probe(&self) -> Result<(), EngineError> {
        if !self.config.model_path.exists() {
            return Err(EngineError::Unavailable(format!(
                "model file not found: {}",
                self.config.model_path.display()
            )));
        }
        Ok(())
    }

    async fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, EngineError> {
        self.probe().await?;

        let config = self.config.clone();
        let audio = audio.to_path_buf();

        // Inference is CPU/GPU bound and blocking; keep it off the runtime
        tokio::task::spawn_blocking(move || run_inference(&config, &audio))
            .await
            .map_err(|e| EngineError::Failed(format!("inference task panicked: {}", e)))?
    }
}

/// Load the model, feed it the demuxed audio and collect timestamped segments
#[cfg(feature = "whisper")]
fn run_inference(config: &WhisperLocalConfig, audio: &Path) -> Result<Vec<TranscriptSegment>, EngineError> {
    LOGGING_HOOKS_INSTALLED.call_once(|| {
        install_logging_hooks();
    });

    let samples = read_wav_samples(audio)?;

    let mut context_params = WhisperContextParameters::default();
    // whisper.cpp falls back to CPU on its own when no accelerator backend is
    // usable, so a GPU preference is handed down as-is and never errors out
    context_params.use_gpu(config.device != DevicePreference::Cpu);

    let context = WhisperContext::new_with_params(
        config.model_path.to_str().ok_or_else(|| {
            EngineError::Unavailable("invalid UTF-8 in model path".to_string())
        })?,
        context_params,
    )
    .map_err(|e| EngineError::Unavailable(format!("failed to load whisper model: {}", e)))?;

    let mut state = context
        .create_state()
        .map_err(|e| EngineError::Failed(format!("failed to create whisper state: {}", e)))?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(config.language.as_deref());
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    state
        .full(params, &samples)
        .map_err(|e| EngineError::Failed(format!("whisper inference failed: {}", e)))?;

    let mut segments = Vec::new();
    for segment in state.as_iter() {
        // whisper timestamps are centiseconds
        let start_ms = (segment.start_timestamp().max(0) as u64) * 10;
        let end_ms = (segment.end_timestamp().max(0) as u64) * 10;
        segments.push(TranscriptSegment::new(start_ms, end_ms, segment.to_string()));
    }

    Ok(segments)
}

/// Read a mono 16-bit PCM WAV into normalized f32 samples
#[cfg(feature = "whisper")]
fn read_wav_samples(audio: &Path) -> Result<Vec<f32>, EngineError> {
    let reader = hound::WavReader::open(audio)
        .map_err(|e| EngineError::Failed(format!("failed to open audio: {}", e)))?;

    let spec = reader.spec();
    if spec.channels != 1 || spec.sample_rate != 16_000 {
        return Err(EngineError::Failed(format!(
            "expected mono 16 kHz audio, got {} channel(s) at {} Hz",
            spec.channels, spec.sample_rate
        )));
    }

    reader
        .into_samples::<i16>()
        .map(|sample| sample.map(|s| s as f32 / 32768.0))
        .collect::<Result<Vec<f32>, _>>()
        .map_err(|e| EngineError::Failed(format!("failed to decode audio: {}", e)))
}

#[cfg(not(feature = "whisper"))]
#[async_trait]
impl Transcriber for WhisperLocalTranscriber {
    fn name(&self) -> &'static str {
        "whisper-local"
    }

    async fn probe(&self) -> Result<(), EngineError> {
        Err(EngineError::Unavailable(
            "built without the `whisper` feature".to_string(),
        ))
    }

    async fn transcribe(&self, _audio: &Path) -> Result<Vec<TranscriptSegment>, EngineError> {
        Err(EngineError::Unavailable(
            "built without the `whisper` feature".to_string(),
        ))
    }
}
