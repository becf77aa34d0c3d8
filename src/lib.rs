/*!
 * # subtier - Tiered Subtitle Extraction
 *
 * A Rust library for acquiring a timed-text transcript for a video by trying
 * progressively more expensive extraction strategies.
 *
 * ## Tiers
 *
 * Attempted in order, cheapest and most trusted first:
 * - Embedded: extract a pre-existing subtitle stream from the container
 * - Optical: recognize burned-in captions from sampled frames
 * - Primary ASR: in-process whisper transcription, gated by a quality check
 * - Fallback ASR: external whisper CLI transcription
 *
 * A tier that is unavailable, fails, or produces a low-quality transcript
 * routes the run to the next tier; only exhausting every tier fails the run.
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `media`: ffprobe/ffmpeg access (stream tables, frame capture, audio demux)
 * - `subtitle_processor`: Cue model and SRT serialization
 * - `engines`: Pluggable recognition engines:
 *   - `engines::tesseract`: Image-to-text via the tesseract CLI
 *   - `engines::whisper_local`: In-process speech recognition (whisper-rs)
 *   - `engines::whisper_cli`: Speech recognition via an external whisper CLI
 * - `extraction`: The tier implementations, the quality assessor and the
 *   pipeline orchestrator
 * - `file_utils`: Filename sanitation and output path derivation
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod engines;
pub mod errors;
pub mod extraction;
pub mod file_utils;
pub mod language_utils;
pub mod media;
pub mod subtitle_processor;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use extraction::orchestrator::{ExtractionOutcome, Orchestrator};
pub use extraction::quality::{QualityAssessor, QualityReport, QualityVerdict};
pub use media::VideoAsset;
pub use subtitle_processor::{SubtitleCue, SubtitleTrack, TrackSource};
pub use errors::{EngineError, MediaError};
