/*!
 * Tiered subtitle extraction.
 *
 * One run walks a fixed sequence of tiers, cheapest and most trusted first:
 * embedded stream probe, burned-caption optical extraction, primary speech
 * recognition (gated by the quality assessor), fallback speech recognition.
 * A tier that is unavailable or fails routes the run to the next tier; only
 * exhausting every tier fails the run.
 *
 * The orchestrator is written against the `SubtitleTier` seam so the routing
 * logic can be exercised with scripted tiers in tests.
 */

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::media::VideoAsset;
use crate::subtitle_processor::SubtitleTrack;

pub mod embedded;
pub mod optical;
pub mod asr;
pub mod quality;
pub mod orchestrator;

/// One strategy attempt in the fallback sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Pre-existing subtitle stream in the container
    Embedded,
    /// Burned-in captions via optical recognition
    Optical,
    /// Primary speech-recognition backend
    AsrPrimary,
    /// Fallback speech-recognition backend
    AsrFallback,
}

impl Tier {
    /// Stable identifier used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Optical => "ocr",
            Self::AsrPrimary => "asr-primary",
            Self::AsrFallback => "asr-fallback",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one tier attempt, consumed solely by the orchestrator
#[derive(Debug)]
pub enum TierOutcome {
    /// The tier's engine could not be loaded, or the tier does not apply
    Unavailable(String),
    /// The tier ran but did not produce a usable track
    Failed(String),
    /// The tier produced a track
    Succeeded(SubtitleTrack),
}

/// How an attempted tier ended, for the final per-tier account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDisposition {
    /// Engine missing or tier not applicable
    Unavailable,
    /// Tier ran and failed
    Failed,
    /// Track produced but rejected by the quality gate
    Rejected,
    /// Track produced and accepted
    Accepted,
}

impl AttemptDisposition {
    /// Stable identifier used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
            Self::Accepted => "accepted",
        }
    }
}

/// Record of one attempted tier and why it ended the way it did
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// The tier that was attempted
    pub tier: Tier,
    /// How the attempt ended
    pub disposition: AttemptDisposition,
    /// Human-readable reason
    pub reason: String,
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {} ({})", self.tier, self.disposition.as_str(), self.reason)
    }
}

/// Terminal pipeline error: every tier was attempted and none yielded an
/// accepted track
#[derive(Debug, Error)]
pub struct AllTiersExhausted {
    /// The attempted tiers in order, with each one's reason
    pub attempts: Vec<AttemptRecord>,
}

impl fmt::Display for AllTiersExhausted {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "all tiers exhausted")?;
        for attempt in &self.attempts {
            write!(f, "\n  - {}", attempt)?;
        }
        Ok(())
    }
}

/// Common trait for extraction tiers
///
/// A tier converts every internal error into a `TierOutcome`; nothing
/// propagates past the orchestrator boundary.
#[async_trait]
pub trait SubtitleTier: Send + Sync {
    /// Which tier this is
    fn tier(&self) -> Tier;

    /// Attempt the extraction against the asset
    async fn attempt(&self, asset: &VideoAsset) -> TierOutcome;
}
