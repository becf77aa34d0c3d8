/*!
 * Mock engine implementations for testing.
 *
 * This module provides mock engines that simulate different behaviors:
 * - `MockTranscriber::working(...)` - Always succeeds with scripted segments
 * - `MockTranscriber::unavailable()` - Reports the engine cannot be loaded
 * - `MockTranscriber::failing()` - Loads, then fails during execution
 * - `MockRecognizer::scripted(...)` - Returns one scripted result per call
 */

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::EngineError;
use crate::engines::{TextRecognizer, Transcriber, TranscriptSegment};

/// Behavior mode for the mock transcriber
#[derive(Debug, Clone)]
pub enum MockTranscriberBehavior {
    /// Always succeeds with the given segments
    Working(Vec<TranscriptSegment>),
    /// Engine cannot be loaded at all
    Unavailable,
    /// Engine loads but throws during execution
    Failing,
    /// Simulates a slow engine (for timeout testing)
    Slow { delay_ms: u64, segments: Vec<TranscriptSegment> },
}

/// Mock transcription backend for testing tier routing
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    behavior: MockTranscriberBehavior,
    /// Number of transcribe calls, shared across clones
    call_count: Arc<AtomicUsize>,
}

impl MockTranscriber {
    /// Create a mock with the specified behavior
    pub fn new(behavior: MockTranscriberBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock that returns the given segments
    pub fn working(segments: Vec<TranscriptSegment>) -> Self {
        Self::new(MockTranscriberBehavior::Working(segments))
    }

    /// Create a mock whose engine cannot be loaded
    pub fn unavailable() -> Self {
        Self::new(MockTranscriberBehavior::Unavailable)
    }

    /// Create a mock that fails during execution
    pub fn failing() -> Self {
        Self::new(MockTranscriberBehavior::Failing)
    }

    /// Number of transcribe invocations so far
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Generate n segments of distinct conversational text
    pub fn generate_segments(n: usize) -> Vec<TranscriptSegment> {
        (0..n)
            .map(|i| {
                TranscriptSegment::new(
                    (i as u64) * 3000,
                    (i as u64) * 3000 + 2500,
                    format!("Spoken line number {}", i + 1),
                )
            })
            .collect()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    fn name(&self) -> &'static str {
        "mock-transcriber"
    }

    async fn probe(&self) -> Result<(), EngineError> {
        match self.behavior {
            MockTranscriberBehavior::Unavailable => {
                Err(EngineError::Unavailable("simulated missing engine".to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn transcribe(&self, _audio: &Path) -> Result<Vec<TranscriptSegment>, EngineError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockTranscriberBehavior::Working(segments) => Ok(segments.clone()),
            MockTranscriberBehavior::Unavailable => {
                Err(EngineError::Unavailable("simulated missing engine".to_string()))
            }
            MockTranscriberBehavior::Failing => {
                Err(EngineError::Failed("simulated execution failure".to_string()))
            }
            MockTranscriberBehavior::Slow { delay_ms, segments } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(segments.clone())
            }
        }
    }
}

/// Mock image-to-text recognizer with one scripted result per call
///
/// Calls past the end of the script return empty recognitions.
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    script: Vec<Option<String>>,
    available: bool,
    call_count: Arc<AtomicUsize>,
}

impl MockRecognizer {
    /// Create a recognizer whose nth call yields the nth scripted result
    ///
    /// `Some(text)` is a recognition, `None` simulates a recognition failure.
    pub fn scripted(script: Vec<Option<String>>) -> Self {
        Self {
            script,
            available: true,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a recognizer that always finds no text
    pub fn blank() -> Self {
        Self::scripted(Vec::new())
    }

    /// Create a recognizer whose engine cannot be loaded
    pub fn unavailable() -> Self {
        Self {
            script: Vec::new(),
            available: false,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of recognize invocations so far
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    fn name(&self) -> &'static str {
        "mock-recognizer"
    }

    async fn probe(&self) -> Result<(), EngineError> {
        if self.available {
            Ok(())
        } else {
            Err(EngineError::Unavailable("simulated missing engine".to_string()))
        }
    }

    async fn recognize(&self, _image: &Path) -> Result<String, EngineError> {
        let index = self.call_count.fetch_add(1, Ordering::SeqCst);

        match self.script.get(index) {
            Some(Some(text)) => Ok(text.clone()),
            Some(None) => Err(EngineError::Failed("simulated recognition failure".to_string())),
            None => Ok(String::new()),
        }
    }
}
