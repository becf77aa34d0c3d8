/*!
 * Fallback speech recognition through the external `whisper` CLI.
 *
 * The CLI writes an SRT next to the audio file; we point it at a scoped
 * temporary directory, parse the SRT back and hand the segments to the tier.
 * A missing binary is reported as unavailable so the orchestrator can close
 * the run with a full per-tier account instead of crashing.
 */

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::app_config::DevicePreference;
use crate::errors::EngineError;
use crate::engines::{Transcriber, TranscriptSegment};
use crate::subtitle_processor::{SubtitleTrack, TrackSource};

/// Time budget for a full transcription run
const TRANSCRIBE_TIMEOUT_SECS: u64 = 3600;

/// Speech-recognition backend driving an external whisper CLI
#[derive(Debug, Clone)]
pub struct WhisperCliTranscriber {
    bin: String,
    model: String,
    language: Option<String>,
    device: DevicePreference,
}

impl WhisperCliTranscriber {
    /// Create a backend for the given binary, model name and language hint
    pub fn new(
        bin: impl Into<String>,
        model: impl Into<String>,
        language: Option<String>,
        device: DevicePreference,
    ) -> Self {
        Self {
            bin: bin.into(),
            model: model.into(),
            language,
            device,
        }
    }

    fn spawn_error(&self, e: std::io::Error) -> EngineError {
        match e.kind() {
            std::io::ErrorKind::NotFound => {
                EngineError::Unavailable(format!("{} binary not found", self.bin))
            }
            _ => EngineError::Failed(format!("failed to spawn {}: {}", self.bin, e)),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    fn name(&self) -> &'static str {
        "whisper-cli"
    }

    async fn probe(&self) -> Result<(), EngineError> {
        let future = Command::new(&self.bin).arg("--help").output();

        let output = tokio::select! {
            result = future => result.map_err(|e| self.spawn_error(e))?,
            _ = tokio::time::sleep(Duration::from_secs(10)) => {
                return Err(EngineError::Unavailable(format!(
                    "{} did not answer --help within 10s", self.bin
                )));
            }
        };

        if !output.status.success() {
            return Err(EngineError::Unavailable(format!(
                "{} --help exited with {}",
                self.bin, output.status
            )));
        }
        Ok(())
    }

    async fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, EngineError> {
        let workdir = tempfile::tempdir()
            .map_err(|e| EngineError::Failed(format!("failed to create work dir: {}", e)))?;

        let mut args: Vec<String> = vec![
            audio.to_string_lossy().to_string(),
            "--model".to_string(), self.model.clone(),
            "--output_format".to_string(), "srt".to_string(),
            "--output_dir".to_string(), workdir.path().to_string_lossy().to_string(),
            "--verbose".to_string(), "False".to_string(),
        ];

        if let Some(language) = &self.language {
            args.push("--language".to_string());
            args.push(language.clone());
        }

        // An explicit CPU request is honored; for auto/gpu the CLI picks the
        // best device itself and silently falls back to CPU when no
        // accelerator is usable.
        if self.device == DevicePreference::Cpu {
            args.push("--device".to_string());
            args.push("cpu".to_string());
        }

        debug!("Running {} over {:?} (model {})", self.bin, audio, self.model);

        let future = Command::new(&self.bin).args(&args).output();

        let output = tokio::select! {
            result = future => result.map_err(|e| self.spawn_error(e))?,
            _ = tokio::time::sleep(Duration::from_secs(TRANSCRIBE_TIMEOUT_SECS)) => {
                return Err(EngineError::Failed(format!(
                    "{} timed out after {}s", self.bin, TRANSCRIBE_TIMEOUT_SECS
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed(format!(
                "{} exited with {}: {}",
                self.bin,
                output.status,
                stderr.lines().last().unwrap_or("")
            )));
        }

        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        let srt_path = workdir.path().join(format!("{}.srt", stem));

        let track = SubtitleTrack::parse_srt_file(TrackSource::AsrFallback, &srt_path)
            .map_err(|e| EngineError::Failed(format!("could not parse CLI output: {}", e)))?;

        Ok(track
            .cues
            .into_iter()
            .map(|cue| TranscriptSegment::new(cue.start_time_ms, cue.end_time_ms, cue.text))
            .collect())
    }
}
