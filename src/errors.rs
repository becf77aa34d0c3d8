/*!
 * Error types for the subtier application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when driving the external media tools (ffprobe/ffmpeg)
#[derive(Error, Debug)]
pub enum MediaError {
    /// Error when the tool could not be spawned at all
    #[error("Failed to spawn {tool}: {message}")]
    Spawn {
        /// Tool binary name
        tool: &'static str,
        /// Underlying I/O error message
        message: String,
    },

    /// Error when the tool did not finish within its time budget
    #[error("{tool} timed out after {seconds}s")]
    Timeout {
        /// Tool binary name
        tool: &'static str,
        /// Time budget that was exceeded
        seconds: u64,
    },

    /// Error when the tool ran but exited with a failure status
    #[error("{tool} failed: {stderr}")]
    CommandFailed {
        /// Tool binary name
        tool: &'static str,
        /// Filtered stderr of the failed invocation
        stderr: String,
    },

    /// Error when the tool output could not be parsed
    #[error("Failed to parse {tool} output: {message}")]
    ParseOutput {
        /// Tool binary name
        tool: &'static str,
        /// Parse error message
        message: String,
    },

    /// Error when the stream table of a media file could not be read
    #[error("Stream table unreadable for {path:?}: {message}")]
    StreamTableUnreadable {
        /// Media file whose metadata was unreadable
        path: PathBuf,
        /// Underlying error message
        message: String,
    },
}

/// Errors reported by pluggable recognition engines (image-to-text and speech-to-text)
///
/// The two variants are the routing signal the orchestrator reacts to: an
/// `Unavailable` engine skips its tier entirely, a `Failed` engine marks the
/// tier as attempted-and-failed. Neither aborts the run.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The underlying engine could not be loaded at all
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine loaded but threw during execution
    #[error("recognition failed: {0}")]
    Failed(String),
}

impl EngineError {
    /// True when the error means the engine never loaded
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineError::Unavailable(_))
    }
}
