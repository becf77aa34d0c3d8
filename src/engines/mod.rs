/*!
 * Pluggable recognition engine implementations.
 *
 * This module contains the capability interfaces the extraction tiers are
 * written against, plus the known engine implementations:
 * - Tesseract: external image-to-text CLI
 * - WhisperLocal: in-process speech recognition (whisper-rs, `whisper` feature)
 * - WhisperCli: external speech-recognition CLI used as the fallback backend
 *
 * Engines are selected by availability probing at startup, never by
 * exception-driven discovery: every engine exposes `probe()`, and an engine
 * that cannot load reports `EngineError::Unavailable` instead of crashing
 * the run.
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

use crate::errors::EngineError;

/// One timestamped text segment produced by a transcription backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    /// Segment start in milliseconds
    pub start_ms: u64,
    /// Segment end in milliseconds
    pub end_ms: u64,
    /// Recognized text
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new segment
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }
}

/// Common trait for image-to-text recognizers
///
/// Implementations recognize text in a single captured frame; an empty
/// string means no text was found in the image.
#[async_trait]
pub trait TextRecognizer: Send + Sync + Debug {
    /// Engine name for logs and the environment report
    fn name(&self) -> &'static str;

    /// Check that the underlying engine can be loaded
    ///
    /// # Returns
    /// * `Result<(), EngineError>` - Ok when the engine is usable, `Unavailable` otherwise
    async fn probe(&self) -> Result<(), EngineError>;

    /// Recognize text in one image file
    ///
    /// # Arguments
    /// * `image` - Path of the captured frame
    ///
    /// # Returns
    /// * `Result<String, EngineError>` - Recognized text, empty when the frame holds none
    async fn recognize(&self, image: &Path) -> Result<String, EngineError>;
}

/// Common trait for speech-recognition backends
///
/// Implementations consume demuxed mono 16 kHz audio and produce ordered
/// timestamped segments with millisecond resolution. A device preference the
/// backend cannot satisfy degrades silently to general-purpose computation.
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    /// Engine name for logs and the environment report
    fn name(&self) -> &'static str;

    /// Check that the underlying engine can be loaded
    async fn probe(&self) -> Result<(), EngineError>;

    /// Transcribe one audio file end-to-end
    ///
    /// # Arguments
    /// * `audio` - Path of the demuxed mono 16 kHz WAV file
    ///
    /// # Returns
    /// * `Result<Vec<TranscriptSegment>, EngineError>` - Ordered segments, or the tagged failure
    async fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>, EngineError>;
}

pub mod tesseract;
pub mod whisper_local;
pub mod whisper_cli;
pub mod mock;
